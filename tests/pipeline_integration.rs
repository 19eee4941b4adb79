mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::translate_body;
use conversai::config::{OllamaConfig, SynthesisConfig, TranslationConfig};
use conversai::providers::OllamaProvider;
use conversai::speech::{CommandPlayer, GoogleTts, Speaker, SpeechOutput};
use conversai::translation::GoogleTranslator;
use conversai::{ChatRole, Language, Session, TurnOrchestrator, TurnSettings};

const TIMEOUT: Duration = Duration::from_secs(5);

fn ollama_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3.2:latest",
        "message": {"role": "assistant", "content": content},
        "done": true
    }))
}

fn orchestrator(server: &MockServer, speech: Option<Arc<dyn SpeechOutput>>) -> TurnOrchestrator {
    let translator = GoogleTranslator::new(
        TranslationConfig {
            api_base: server.uri(),
            ..TranslationConfig::default()
        },
        TIMEOUT,
    )
    .unwrap();
    let provider = OllamaProvider::new(
        OllamaConfig {
            host: server.uri(),
            ..OllamaConfig::default()
        },
        TIMEOUT,
    )
    .unwrap();
    TurnOrchestrator::new(Arc::new(translator), Arc::new(provider), speech)
}

async fn mount_hindi_round_trip(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("sl", "hi"))
        .and(query_param("tl", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(translate_body("What is rain?")))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("sl", "en"))
        .and(query_param("tl", "hi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(translate_body("बारिश पानी है")))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_hindi_turn_with_summary() {
    let server = MockServer::start().await;
    mount_hindi_round_trip(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "What is rain?"}]
        })))
        .respond_with(ollama_reply("Rain is water that falls from clouds."))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": "Summarize this in points:\nRain is water that falls from clouds."
            }]
        })))
        .respond_with(ollama_reply("- Rain is water"))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server, None);
    let settings = TurnSettings::new(Language::Hindi, Language::Hindi, false, true);
    let mut session = Session::new(settings);
    session.draft = "बारिश क्या है?".to_string();

    let outcome = orchestrator
        .process_turn(&mut session, "बारिश क्या है?", settings)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.translated_question, "What is rain?");
    assert_eq!(outcome.answer, "बारिश पानी है");
    assert!(outcome.summarized);
    assert!(!outcome.spoken);
    assert!(outcome.speech_error.is_none());

    let turns: Vec<_> = session.history.iter().collect();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role(), ChatRole::Assistant);
    assert_eq!(turns[0].text(), "बारिश पानी है");
    assert_eq!(turns[1].role(), ChatRole::User);
    assert_eq!(turns[1].text(), "बारिश क्या है?");
    assert!(session.draft.is_empty());
}

#[tokio::test]
async fn test_generation_failure_leaves_session_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .respond_with(ResponseTemplate::new(200).set_body_json(translate_body("What is rain?")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server, None);
    let settings = TurnSettings::new(Language::Hindi, Language::English, false, false);
    let mut session = Session::new(settings);
    session.draft = "बारिश क्या है?".to_string();

    let result = orchestrator
        .process_turn(&mut session, "बारिश क्या है?", settings)
        .await;

    assert!(result.is_err());
    assert!(session.history.is_empty());
    assert_eq!(session.draft, "बारिश क्या है?");
}

#[cfg(unix)]
#[tokio::test]
async fn test_voice_turn_speaks_answer_in_answer_language() {
    let server = MockServer::start().await;
    mount_hindi_round_trip(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply("Rain is water."))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .and(query_param("tl", "hi"))
        .and(query_param("q", "बारिश पानी है"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3audio".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let tts = GoogleTts::new(
        SynthesisConfig {
            api_base: server.uri(),
            ..SynthesisConfig::default()
        },
        TIMEOUT,
    )
    .unwrap();
    let player = CommandPlayer::new(&["true".to_string()]).unwrap();
    let speech: Arc<dyn SpeechOutput> = Arc::new(Speaker::new(Arc::new(tts), Arc::new(player)));

    let orchestrator = orchestrator(&server, Some(speech));
    let settings = TurnSettings::new(Language::Hindi, Language::Hindi, true, false);
    let mut session = Session::new(settings);

    let outcome = orchestrator
        .process_turn(&mut session, "बारिश क्या है?", settings)
        .await
        .unwrap()
        .unwrap();

    assert!(outcome.spoken);
    assert!(outcome.speech_error.is_none());
    assert_eq!(session.history.len(), 2);
}

#[tokio::test]
async fn test_voice_without_output_reports_error_but_answers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply("Hello!"))
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server, None);
    let settings = TurnSettings::new(Language::English, Language::English, true, false);
    let mut session = Session::new(settings);

    let outcome = orchestrator
        .process_turn(&mut session, "hi", settings)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.answer, "Hello!");
    assert!(!outcome.spoken);
    assert!(outcome.speech_error.is_some());
    assert_eq!(session.history.len(), 2);
}
