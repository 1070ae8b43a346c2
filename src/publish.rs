//! Delivery of a run's digest to the Telegram channel.
//!
//! A batch is a header message, one message per accepted article, and a footer
//! with the count when at least one article went out. A failed send is logged
//! and the next message is attempted; nothing is retried.
//!
//! When no bot token or chat id is configured, [`ChannelPublisher::DryRun`]
//! logs every message instead of sending it.
//!
//! # Messages Published
//!
//! | Message | Content |
//! |---------|---------|
//! | Header | Flag, digest title, local date and time |
//! | Article | Title, summary, link, source name |
//! | Footer | Number of articles sent, next update hint |

use crate::error::PublishError;
use crate::models::{AcceptedItem, Digest};
use chrono::{DateTime, Local};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Default Telegram Bot API base URL.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Trait for async channel delivery.
pub trait Publisher {
    /// Send one HTML-formatted message.
    async fn send(&self, text: &str) -> Result<(), PublishError>;
}

/// Delays between messages of a batch.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub after_header: Duration,
    pub between_items: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_header: Duration::from_secs(2),
            between_items: Duration::from_secs(3),
        }
    }
}

impl Pacing {
    /// No delays at all.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            after_header: Duration::ZERO,
            between_items: Duration::ZERO,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends messages through the Telegram Bot API `sendMessage` method.
#[derive(Clone)]
pub struct TelegramPublisher {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl fmt::Debug for TelegramPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramPublisher")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramPublisher {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .use_rustls_tls()
                .timeout(Duration::from_secs(15))
                .build()?,
            api_base: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Point at a different Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

impl Publisher for TelegramPublisher {
    #[instrument(level = "debug", skip_all)]
    async fn send(&self, text: &str) -> Result<(), PublishError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let response = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
                parse_mode: "HTML",
                disable_web_page_preview: false,
            })
            .send()
            .await
            .map_err(|e| PublishError::Http(e.without_url()))?;

        let status = response.status();
        let body: Option<TelegramResponse> = response.json().await.ok();
        match body {
            Some(TelegramResponse { ok: true, .. }) if status.is_success() => Ok(()),
            other => Err(PublishError::Rejected {
                status: status.as_u16(),
                description: other
                    .and_then(|b| b.description)
                    .unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    async fn send(&self, text: &str) -> Result<(), PublishError> {
        info!(message = %text, "Dry run; message not sent");
        Ok(())
    }
}

/// The publisher selected at startup.
#[derive(Debug, Clone)]
pub enum ChannelPublisher {
    Telegram(TelegramPublisher),
    DryRun(LogPublisher),
}

impl ChannelPublisher {
    /// Telegram when both credentials are present, dry run otherwise.
    ///
    /// # Arguments
    ///
    /// * `token` - Bot token, `None` or empty for a dry run
    /// * `chat_id` - Target chat id or `@channel`, `None` or empty for a dry run
    /// * `api_base` - Bot API server, normally [`TELEGRAM_API_BASE`]
    pub fn from_credentials(
        token: Option<&str>,
        chat_id: Option<&str>,
        api_base: &str,
    ) -> Result<Self, reqwest::Error> {
        match (token.filter(|t| !t.is_empty()), chat_id.filter(|c| !c.is_empty())) {
            (Some(token), Some(chat_id)) => Ok(Self::Telegram(
                TelegramPublisher::new(token, chat_id)?.with_api_base(api_base),
            )),
            _ => Ok(Self::DryRun(LogPublisher)),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun(_))
    }
}

impl Publisher for ChannelPublisher {
    async fn send(&self, text: &str) -> Result<(), PublishError> {
        match self {
            Self::Telegram(p) => p.send(text).await,
            Self::DryRun(p) => p.send(text).await,
        }
    }
}

/// Opening message of a batch.
pub fn render_header(now: DateTime<Local>) -> String {
    format!(
        "🇸🇾 <b>آخر الأخبار السورية</b>\n\n📅 {}\n━━━━━━━━━━━━━━━━━━━━━━━━━",
        now.format("%Y-%m-%d %H:%M")
    )
}

/// One article, with user-provided text HTML-escaped.
pub fn render_item(item: &AcceptedItem) -> String {
    format!(
        "📰 <b>{}</b>\n\n📝 <b>الموجز:</b>\n{}\n\n🔗 <a href=\"{}\">اقرأ المزيد</a>\n\n📡 المصدر: {}",
        html_escape::encode_text(&item.title),
        html_escape::encode_text(&item.summary),
        html_escape::encode_double_quoted_attribute(&item.link),
        html_escape::encode_text(&item.source),
    )
}

/// Closing message of a batch.
pub fn render_footer(sent: usize) -> String {
    format!(
        "✅ <b>تم إرسال {sent} خبر سوري</b>\n\n📱 للمزيد من الأخبار، تابع القناة\n🕐 التحديث التالي خلال ساعة"
    )
}

/// Send `digest` as one batch.
///
/// # Arguments
///
/// * `publisher` - Channel to send through
/// * `digest` - Accepted articles of this run, in publishing order
/// * `pacing` - Delays after the header and between articles
///
/// # Returns
///
/// The number of articles delivered. An empty digest sends nothing, and the
/// footer is only sent when at least one article went out.
#[instrument(level = "info", skip_all, fields(articles = digest.total_items()))]
pub async fn publish_digest<P: Publisher>(publisher: &P, digest: &Digest, pacing: Pacing) -> usize {
    if digest.is_empty() {
        info!("No new articles; nothing to publish");
        return 0;
    }

    match publisher.send(&render_header(Local::now())).await {
        Ok(()) => sleep(pacing.after_header).await,
        Err(e) => error!(error = %e, "Failed to send header message"),
    }

    let mut sent = 0usize;
    for item in digest.items() {
        match publisher.send(&render_item(item)).await {
            Ok(()) => {
                sent += 1;
                info!(source = %item.source, link = %item.link, "Published article");
                sleep(pacing.between_items).await;
            }
            Err(e) => {
                error!(source = %item.source, link = %item.link, error = %e, "Failed to publish article");
            }
        }
    }

    if sent > 0 {
        if let Err(e) = publisher.send(&render_footer(sent)).await {
            error!(error = %e, "Failed to send footer message");
        }
    }

    info!(sent, total = digest.total_items(), "Publishing complete");
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records messages; fails every message containing `fail_on`.
    #[derive(Default)]
    struct RecordingPublisher {
        sent: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl Publisher for RecordingPublisher {
        async fn send(&self, text: &str) -> Result<(), PublishError> {
            if self.fail_on.is_some_and(|f| text.contains(f)) {
                return Err(PublishError::Rejected {
                    status: 400,
                    description: "test failure".to_string(),
                });
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn item(title: &str, source: &str) -> AcceptedItem {
        AcceptedItem {
            title: title.to_string(),
            link: format!("https://example.com/{}", title.len()),
            source: source.to_string(),
            summary: format!("{title}..."),
            content_preview: String::new(),
        }
    }

    fn digest() -> Digest {
        let mut digest = Digest::default();
        digest.push("Source A", vec![item("First Syria story", "Source A")]);
        digest.push(
            "Source B",
            vec![
                item("Second Syria story here", "Source B"),
                item("Third Syria story, broken", "Source B"),
            ],
        );
        digest
    }

    #[test]
    fn test_render_item_escapes_html() {
        let mut it = item("Aleppo <update> & more", "BBC");
        it.link = "https://example.com/a?x=1&y=\"2\"".to_string();
        let text = render_item(&it);
        assert!(text.contains("Aleppo &lt;update&gt; &amp; more"));
        assert!(text.contains("href=\"https://example.com/a?x=1&amp;y=&quot;2&quot;\""));
        assert!(text.contains("📡 المصدر: BBC"));
    }

    #[test]
    fn test_render_footer_counts() {
        assert!(render_footer(3).contains("تم إرسال 3 خبر سوري"));
    }

    #[tokio::test]
    async fn test_publish_digest_sends_header_items_footer() {
        let publisher = RecordingPublisher::default();
        let sent = publish_digest(&publisher, &digest(), Pacing::none()).await;

        assert_eq!(sent, 3);
        let messages = publisher.sent.lock().unwrap();
        assert_eq!(messages.len(), 5);
        assert!(messages[0].contains("آخر الأخبار السورية"));
        assert!(messages[1].contains("First Syria story"));
        assert!(messages[4].contains("تم إرسال 3"));
    }

    #[tokio::test]
    async fn test_publish_digest_continues_after_failure() {
        let publisher = RecordingPublisher {
            fail_on: Some("broken"),
            ..Default::default()
        };
        let sent = publish_digest(&publisher, &digest(), Pacing::none()).await;

        assert_eq!(sent, 2);
        let messages = publisher.sent.lock().unwrap();
        assert!(messages.last().unwrap().contains("تم إرسال 2"));
    }

    #[tokio::test]
    async fn test_publish_empty_digest_sends_nothing() {
        let publisher = RecordingPublisher::default();
        assert_eq!(publish_digest(&publisher, &Digest::default(), Pacing::none()).await, 0);
        assert!(publisher.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_footer_when_every_item_fails() {
        let publisher = RecordingPublisher {
            fail_on: Some("📰"),
            ..Default::default()
        };
        assert_eq!(publish_digest(&publisher, &digest(), Pacing::none()).await, 0);
        assert_eq!(publisher.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_credentials_select_dry_run() {
        assert!(ChannelPublisher::from_credentials(None, Some("123"), TELEGRAM_API_BASE).unwrap().is_dry_run());
        assert!(ChannelPublisher::from_credentials(Some("t"), None, TELEGRAM_API_BASE).unwrap().is_dry_run());
        assert!(ChannelPublisher::from_credentials(Some(""), Some("123"), TELEGRAM_API_BASE).unwrap().is_dry_run());
        assert!(!ChannelPublisher::from_credentials(Some("t"), Some("123"), TELEGRAM_API_BASE).unwrap().is_dry_run());
    }

    #[tokio::test]
    async fn test_telegram_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_partial_json(json!({
                "chat_id": "@channel",
                "text": "hello",
                "parse_mode": "HTML"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = TelegramPublisher::new("TOKEN", "@channel")
            .unwrap()
            .with_api_base(server.uri());
        publisher.send("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_publisher_uses_configured_api_base() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher =
            ChannelPublisher::from_credentials(Some("TOKEN"), Some("@channel"), &format!("{}/", server.uri()))
                .unwrap();
        assert!(!publisher.is_dry_run());
        publisher.send("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_telegram_rejection_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"ok": false, "description": "Bad Request: chat not found"})),
            )
            .mount(&server)
            .await;

        let publisher = TelegramPublisher::new("TOKEN", "@missing")
            .unwrap()
            .with_api_base(server.uri());
        let err = publisher.send("hello").await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::Rejected { status: 400, ref description } if description.contains("chat not found")
        ));
    }
}
