//! End-to-end pipeline runs against mocked weather and completion services.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate};
use secrecy::SecretString;
use weather_digest_core::{
    EmailMessage, Location, Notifier, Pipeline, RunOutcome, SendError, Stage, UnitSystem,
    provider::openweather::OpenWeatherProvider, summarizer::openai::OpenAiSummarizer,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Default, Clone)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), SendError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

fn forecast_body() -> serde_json::Value {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp();

    let descriptions = ["clear sky", "few clouds", "light rain", "mist"];
    let list: Vec<_> = (0..16)
        .map(|i| {
            serde_json::json!({
                "dt": start + i * 3 * 3600,
                "main": {"temp": 60.4 + i as f64},
                "weather": [{"id": 800, "main": "x", "description": descriptions[i as usize % 4]}],
                "pop": 0.25
            })
        })
        .collect();

    serde_json::json!({"cod": "200", "cnt": 16, "list": list, "city": {"name": "Atlanta"}})
}

async fn weather_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("zip", "30308,us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;
    server
}

fn pipeline(weather_uri: String, ai_uri: String, notifier: RecordingNotifier) -> Pipeline {
    let provider =
        OpenWeatherProvider::with_api_key(SecretString::from("ow"), UnitSystem::Imperial)
            .with_base_url(weather_uri)
            .with_utc_offset(FixedOffset::east_opt(0).unwrap());
    let summarizer = OpenAiSummarizer::with_api_key(SecretString::from("sk"), "Atlanta (30308)")
        .with_base_url(ai_uri);

    Pipeline::new(
        Location::default(),
        vec!["a@example.com".into(), "b@example.com".into()],
        Box::new(provider),
        Box::new(summarizer),
        Box::new(notifier),
    )
    .with_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

#[tokio::test]
async fn full_run_sends_one_email() {
    let weather = weather_server().await;
    let ai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "A pleasant day overall."}}]
        })))
        .expect(1)
        .mount(&ai)
        .await;

    let notifier = RecordingNotifier::default();
    let outcome = pipeline(weather.uri(), ai.uri(), notifier.clone()).run_logged().await;
    assert_eq!(outcome, RunOutcome::Sent);

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);

    let message = &sent[0];
    assert_eq!(message.subject, "Weather Update June 01, 2024");
    assert_eq!(message.recipients.len(), 2);
    assert!(message.body.starts_with("A pleasant day overall.\n"));

    let bullets: Vec<&str> = message.body.lines().filter(|l| l.starts_with("- **")).collect();
    assert_eq!(bullets.len(), 6);
    assert_eq!(bullets[0], "- **6 AM**: 62°F, 25% chance of rain 🌧️, light rain");
    assert_eq!(bullets[5], "- **9 PM**: 67°F, 25% chance of rain 🌫️, mist");
}

#[tokio::test]
async fn completion_failure_sends_nothing() {
    let weather = weather_server().await;
    let ai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&ai)
        .await;

    let notifier = RecordingNotifier::default();
    let outcome = pipeline(weather.uri(), ai.uri(), notifier.clone()).run_logged().await;

    assert_eq!(outcome, RunOutcome::Failed(Stage::Summarize));
    assert!(notifier.sent.lock().unwrap().is_empty());
}
