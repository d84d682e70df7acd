//! Google web search by scraping the results page.

use scraper::Html;
use selina_core::error::SelinaError;
use serde::Serialize;

use crate::http::{get_text, selector, Services};

const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl Services {
    /// Up to five organic results. An empty list means nothing matched.
    pub async fn google(&self, query: &str) -> Result<Vec<SearchResult>, SelinaError> {
        let req = self
            .client
            .get(&self.config.google_url)
            .query(&[("q", query), ("num", "5")])
            .timeout(self.search_timeout());
        let html = get_text(req, "google").await?;
        parse_google_results(&html)
    }
}

/// Extract result blocks (`.g`) from a Google results page.
pub fn parse_google_results(html: &str) -> Result<Vec<SearchResult>, SelinaError> {
    let document = Html::parse_document(html);
    let block = selector(".g")?;
    let title_sel = selector("h3")?;
    let link_sel = selector("a")?;
    let desc_sel = selector(".VwiC3b, .lyLwlc")?;

    let mut results = Vec::new();
    for element in document.select(&block).take(MAX_RESULTS) {
        let title = element
            .select(&title_sel)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        let link = element
            .select(&link_sel)
            .next()
            .and_then(|e| e.value().attr("href"))
            .unwrap_or("")
            .to_string();
        let description = element
            .select(&desc_sel)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "No description available".to_string());

        if !title.is_empty() && !link.is_empty() {
            results.push(SearchResult {
                title,
                link,
                description,
            });
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_google_results() {
        let html = r#"
            <html><body>
              <div class="g"><a href="https://www.rust-lang.org/"><h3>Rust</h3></a>
                <div class="VwiC3b">A language empowering everyone.</div></div>
              <div class="g"><a href="https://docs.rs/"><h3>Docs.rs</h3></a></div>
              <div class="g"><span>no title or link</span></div>
            </body></html>
        "#;
        let results = parse_google_results(html).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[0].link, "https://www.rust-lang.org/");
        assert_eq!(results[0].description, "A language empowering everyone.");
        assert_eq!(results[1].description, "No description available");
    }

    #[test]
    fn test_parse_google_results_caps_at_five_blocks() {
        let block = r#"<div class="g"><a href="https://x.test/"><h3>X</h3></a></div>"#;
        let html = format!("<html><body>{}</body></html>", block.repeat(8));
        assert_eq!(parse_google_results(&html).unwrap().len(), 5);
    }

    #[test]
    fn test_parse_google_results_empty_page() {
        assert!(parse_google_results("<html></html>").unwrap().is_empty());
    }
}
