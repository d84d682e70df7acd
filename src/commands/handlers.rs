use super::{format, Command, CommandContext, Dispatcher};
use selina_channels::to_sticker;
use selina_core::{
    error::SelinaError,
    message::{Media, MediaKind},
};
use selina_services::downloader::{detect_platform, Platform};
use tracing::debug;

impl Dispatcher {
    pub(super) async fn run(
        &self,
        command: Command,
        ctx: &CommandContext<'_>,
    ) -> Result<(), SelinaError> {
        let args = ctx.args;
        let first_arg = args.split_whitespace().next().unwrap_or("");

        match command {
            Command::Menu => ctx.reply(&format::menu(&self.bot_name, &self.bot.prefix)).await,
            Command::Settings => ctx.reply(&format::settings(ctx.settings)).await,
            Command::Alive => {
                let text = format::alive(&self.bot_name, self.started.elapsed(), &self.bot.version);
                ctx.reply(&text).await
            }
            Command::Owner => ctx.reply(&format::owner(&self.bot_name, &self.bot)).await,
            Command::Google => {
                self.typing(ctx).await;
                let results = self.services.google(args).await?;
                ctx.reply(&format::google(args, &results)).await
            }
            Command::Ai => {
                self.typing(ctx).await;
                let answer = self.services.chat(args).await;
                ctx.reply(&format::ai(&answer)).await
            }
            Command::TextToImage => {
                self.typing(ctx).await;
                let bytes = self.services.text_to_image(args).await?;
                let mut media = Media::image(bytes, Some(format!("📝 {args}")));
                media.mimetype = "image/png".into();
                ctx.conn.send_media(&ctx.message.chat_id, media).await
            }
            Command::Sticker => self.sticker(ctx).await,
            Command::TikTok => {
                self.typing(ctx).await;
                let video = self.services.tiktok(first_arg).await?;
                self.send_video(ctx, "🎵 Downloading...", &video.video).await
            }
            Command::Instagram => {
                self.typing(ctx).await;
                let media = self.services.instagram(first_arg).await?;
                self.send_video(ctx, "📸 Downloading...", &media.url).await
            }
            Command::Facebook => {
                self.typing(ctx).await;
                let links = self.services.facebook(first_arg).await?;
                ctx.reply(&format::facebook(&links)).await
            }
            Command::Spotify => {
                self.typing(ctx).await;
                let track = self.services.spotify(first_arg).await?;
                ctx.reply(&format::spotify(&track)).await
            }
            Command::Apk => {
                self.typing(ctx).await;
                let hit = self.services.apk(args).await?;
                ctx.reply(&format::apk(&hit)).await
            }
            Command::MediaFire => {
                self.typing(ctx).await;
                let file = self.services.mediafire(first_arg).await?;
                ctx.reply(&format::mediafire(&file)).await
            }
            Command::Yts => {
                self.typing(ctx).await;
                let movies = self.services.yts_search(args).await?;
                ctx.reply(&format::yts(&movies)).await
            }
            Command::Movie => {
                self.typing(ctx).await;
                let info = self.services.movie_info(args).await?;
                ctx.reply(&format::movie(&info)).await
            }
            Command::Download => self.download(ctx, first_arg).await,
            Command::Weather => {
                self.typing(ctx).await;
                let weather = self.services.weather(args).await?;
                ctx.reply(&format::weather(args, &weather)).await
            }
            Command::Joke => {
                self.typing(ctx).await;
                let joke = self.services.joke().await?;
                ctx.reply(&format::joke(&joke)).await
            }
            Command::Quote => {
                self.typing(ctx).await;
                let quote = self.services.quote().await?;
                ctx.reply(&format::quote(&quote)).await
            }
            Command::Translate => {
                let Some((lang, text)) = args.split_once(char::is_whitespace) else {
                    let usage = format!("Usage: {}translate <lang> <text>", self.bot.prefix);
                    return ctx.reply(&usage).await;
                };
                self.typing(ctx).await;
                let translated = self.services.translate(lang, text.trim()).await?;
                ctx.reply(&format::translation(lang, &translated)).await
            }
        }
    }

    async fn typing(&self, ctx: &CommandContext<'_>) {
        if let Err(e) = ctx.conn.send_typing(&ctx.message.chat_id).await {
            debug!("[{}] typing indicator failed: {e}", ctx.bot_id);
        }
    }

    async fn sticker(&self, ctx: &CommandContext<'_>) -> Result<(), SelinaError> {
        self.typing(ctx).await;
        let image = ctx
            .message
            .attachment
            .as_ref()
            .filter(|m| m.kind == MediaKind::Image && !m.data.is_empty());
        let Some(image) = image else {
            let hint = format!("❌ Send an image with {}sticker as its caption", self.bot.prefix);
            return ctx.reply(&hint).await;
        };

        let data = image.data.clone();
        let webp = tokio::task::spawn_blocking(move || to_sticker(&data))
            .await
            .map_err(|e| SelinaError::Validation(format!("sticker task failed: {e}")))??;
        ctx.conn
            .send_media(&ctx.message.chat_id, Media::sticker(webp))
            .await
    }

    /// Announce, fetch and send a video.
    async fn send_video(
        &self,
        ctx: &CommandContext<'_>,
        notice: &str,
        url: &str,
    ) -> Result<(), SelinaError> {
        ctx.reply(notice).await?;
        let bytes = self
            .services
            .fetch_bytes(url, self.services.media_timeout())
            .await?;
        ctx.conn
            .send_media(&ctx.message.chat_id, Media::video(bytes, None))
            .await
    }

    async fn download(&self, ctx: &CommandContext<'_>, url: &str) -> Result<(), SelinaError> {
        let Some(platform) = detect_platform(url) else {
            return ctx
                .reply("❌ Unsupported link. Try TikTok, Instagram, Facebook, Spotify or MediaFire.")
                .await;
        };
        debug!("[{}] download routed to {platform:?}", ctx.bot_id);
        self.typing(ctx).await;

        match platform {
            Platform::TikTok => {
                let video = self.services.tiktok(url).await?;
                self.send_video(ctx, "🎵 Downloading...", &video.video).await
            }
            Platform::Instagram => {
                let media = self.services.instagram(url).await?;
                self.send_video(ctx, "📸 Downloading...", &media.url).await
            }
            Platform::Facebook => {
                let links = self.services.facebook(url).await?;
                ctx.reply(&format::facebook(&links)).await
            }
            Platform::Spotify => {
                let track = self.services.spotify(url).await?;
                ctx.reply(&format::spotify(&track)).await
            }
            Platform::MediaFire => {
                let file = self.services.mediafire(url).await?;
                ctx.reply(&format::mediafire(&file)).await
            }
        }
    }
}
