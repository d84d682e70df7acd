//! Chat commands: routing inbound text to service adapters and replying.

mod format;
mod handlers;


use rand::seq::SliceRandom;
use selina_core::{
    config::BotConfig,
    message::InboundMessage,
    models::{Settings, DEFAULT_REACTIONS},
    traits::Connection,
};
use selina_services::Services;
use selina_store::Store;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Known chat commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Menu,
    Settings,
    Alive,
    Owner,
    Google,
    Ai,
    TextToImage,
    Sticker,
    TikTok,
    Instagram,
    Facebook,
    Spotify,
    Apk,
    MediaFire,
    Yts,
    Movie,
    Download,
    Weather,
    Joke,
    Quote,
    Translate,
}

/// How a table entry recognizes its command text (prefix already stripped).
#[derive(Debug, Clone, Copy)]
enum Matcher {
    Exact(&'static str),
    /// Literal prefix. One ending in a space also accepts the bare word.
    Prefix(&'static str),
}

impl Matcher {
    /// Length of the matched keyword, if `rest` matches.
    fn matches(&self, rest: &str) -> Option<usize> {
        match *self {
            Matcher::Exact(word) => (rest == word).then_some(word.len()),
            Matcher::Prefix(word) => {
                if rest.starts_with(word) {
                    Some(word.len())
                } else {
                    let bare = word.strip_suffix(' ')?;
                    (rest == bare).then_some(bare.len())
                }
            }
        }
    }
}

/// Ordered routing table. First match wins.
const COMMANDS: &[(&[Matcher], Command)] = &[
    (&[Matcher::Exact("menu"), Matcher::Exact("help")], Command::Menu),
    (&[Matcher::Exact("settings")], Command::Settings),
    (&[Matcher::Exact("alive"), Matcher::Exact("ping")], Command::Alive),
    (&[Matcher::Exact("owner"), Matcher::Exact("dev")], Command::Owner),
    (&[Matcher::Prefix("google ")], Command::Google),
    (&[Matcher::Prefix("ai "), Matcher::Prefix("gpt ")], Command::Ai),
    (&[Matcher::Prefix("c2i ")], Command::TextToImage),
    (&[Matcher::Prefix("sticker"), Matcher::Prefix("s ")], Command::Sticker),
    (&[Matcher::Prefix("tiktok "), Matcher::Prefix("tt ")], Command::TikTok),
    (&[Matcher::Prefix("instagram "), Matcher::Prefix("ig ")], Command::Instagram),
    (&[Matcher::Prefix("facebook "), Matcher::Prefix("fb ")], Command::Facebook),
    (&[Matcher::Prefix("spotify "), Matcher::Prefix("sp ")], Command::Spotify),
    (&[Matcher::Prefix("apk ")], Command::Apk),
    (&[Matcher::Prefix("mediafire "), Matcher::Prefix("mf ")], Command::MediaFire),
    (&[Matcher::Prefix("yts ")], Command::Yts),
    (&[Matcher::Prefix("movie ")], Command::Movie),
    (&[Matcher::Prefix("download "), Matcher::Prefix("dl ")], Command::Download),
    (&[Matcher::Prefix("weather ")], Command::Weather),
    (&[Matcher::Exact("joke")], Command::Joke),
    (&[Matcher::Exact("quote")], Command::Quote),
    (&[Matcher::Prefix("translate "), Matcher::Prefix("tr ")], Command::Translate),
];

impl Command {
    /// Route trimmed message text. Returns the command and its argument text
    /// (original casing, trimmed), or `None` when nothing matches.
    pub fn parse<'a>(text: &'a str, prefix: &str) -> Option<(Self, &'a str)> {
        let text = text.trim();
        let rest = strip_prefix_ci(text, prefix)?;
        let lower = rest.to_lowercase();

        for (matchers, command) in COMMANDS {
            for matcher in *matchers {
                if let Some(len) = matcher.matches(&lower) {
                    let args = rest.get(len..).unwrap_or("").trim();
                    return Some((*command, args));
                }
            }
        }
        None
    }

    /// Usage line for commands that need an argument.
    pub fn usage(&self) -> Option<&'static str> {
        match self {
            Command::Google => Some("google <query>"),
            Command::Ai => Some("ai <message>"),
            Command::TextToImage => Some("c2i <text>"),
            Command::TikTok => Some("tiktok <url>"),
            Command::Instagram => Some("instagram <url>"),
            Command::Facebook => Some("facebook <url>"),
            Command::Spotify => Some("spotify <url>"),
            Command::Apk => Some("apk <app name>"),
            Command::MediaFire => Some("mediafire <url>"),
            Command::Yts => Some("yts <query>"),
            Command::Movie => Some("movie <url>"),
            Command::Download => Some("download <url>"),
            Command::Weather => Some("weather <city>"),
            Command::Translate => Some("translate <lang> <text>"),
            _ => None,
        }
    }

    /// Fixed line sent to the chat when the handler fails.
    pub fn error_line(&self) -> &'static str {
        match self {
            Command::Google => "❌ Error performing search.",
            Command::Ai => "❌ Error connecting to AI.",
            Command::TextToImage => "❌ Error generating image.",
            Command::Sticker => "❌ Error creating sticker.",
            Command::TikTok
            | Command::Instagram
            | Command::Facebook
            | Command::Spotify
            | Command::MediaFire
            | Command::Download => "❌ Download failed.",
            Command::Apk => "❌ APK search failed.",
            Command::Yts => "❌ Search failed.",
            Command::Movie => "❌ Fetch failed.",
            Command::Weather => "❌ Weather fetch failed.",
            Command::Joke => "❌ Joke fetch failed.",
            Command::Quote => "❌ Quote fetch failed.",
            Command::Translate => "❌ Translation failed.",
            Command::Menu | Command::Settings | Command::Alive | Command::Owner => {
                "❌ An error occurred. Please try again later."
            }
        }
    }
}

/// Case-insensitive prefix strip on a char boundary.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// Pick a reaction uniformly from the bot's set, falling back to the defaults.
pub fn choose_reaction(reactions: &[String]) -> String {
    let mut rng = rand::thread_rng();
    reactions
        .choose(&mut rng)
        .cloned()
        .or_else(|| DEFAULT_REACTIONS.choose(&mut rng).map(|r| r.to_string()))
        .unwrap_or_default()
}

/// Everything a handler needs to answer one message.
pub(crate) struct CommandContext<'a> {
    pub bot_id: &'a str,
    pub conn: &'a dyn Connection,
    pub message: &'a InboundMessage,
    pub args: &'a str,
    pub settings: &'a Settings,
}

impl CommandContext<'_> {
    async fn reply(&self, text: &str) -> Result<(), selina_core::error::SelinaError> {
        self.conn.send_text(&self.message.chat_id, text).await
    }
}

/// Handles inbound messages for every session.
pub struct Dispatcher {
    store: Store,
    services: Arc<Services>,
    bot: BotConfig,
    bot_name: String,
    started: Instant,
}

impl Dispatcher {
    pub fn new(store: Store, services: Arc<Services>, bot: BotConfig, bot_name: &str) -> Self {
        Self {
            store,
            services,
            bot,
            bot_name: bot_name.to_string(),
            started: Instant::now(),
        }
    }

    /// React and reply to one inbound message.
    pub async fn handle(&self, bot_id: &str, conn: Arc<dyn Connection>, message: InboundMessage) {
        let text = message.text.trim();
        let settings = match self.store.settings_for(bot_id).await {
            Ok(s) => s,
            Err(e) => {
                warn!("[{bot_id}] settings unavailable, using defaults: {e}");
                Settings::defaults_for(bot_id)
            }
        };

        let is_command = strip_prefix_ci(text, &self.bot.prefix).is_some();
        if !is_command {
            if settings.auto_react && !message.from_me {
                self.react(conn.as_ref(), &message, &settings).await;
            }
            return;
        }

        if settings.react_to_commands {
            self.react(conn.as_ref(), &message, &settings).await;
        }

        let Some((command, args)) = Command::parse(text, &self.bot.prefix) else {
            debug!("[{bot_id}] unknown command: {text}");
            return;
        };
        info!("[{bot_id}] command {command:?} from {}", message.sender_id);

        let ctx = CommandContext {
            bot_id,
            conn: conn.as_ref(),
            message: &message,
            args,
            settings: &settings,
        };

        if args.is_empty() {
            if let Some(usage) = command.usage() {
                let line = format!("Usage: {}{usage}", self.bot.prefix);
                if let Err(e) = ctx.reply(&line).await {
                    warn!("[{bot_id}] failed to send usage: {e}");
                }
                return;
            }
        }

        if let Err(e) = self.run(command, &ctx).await {
            warn!("[{bot_id}] {command:?} failed: {e}");
            if let Err(e) = ctx.reply(command.error_line()).await {
                warn!("[{bot_id}] failed to send error line: {e}");
            }
        }
    }

    async fn react(&self, conn: &dyn Connection, message: &InboundMessage, settings: &Settings) {
        let emoji = choose_reaction(&settings.reactions);
        if let Err(e) = conn.react(message, &emoji).await {
            debug!("reaction failed: {e}");
        }
    }
}
