//! End-to-end generation through the retry executor, sanitizer, parser and fallback.

use super::test_utils::{BrokenSink, InstantSleeper, MemorySink, StubRemote};
use std::sync::Arc;
use widgetforge::fallback::get_fallback;
use widgetforge::generation::{GenerationService, RetryConfig, RetryExecutor};
use widgetforge::sink::ArtifactSink;
use widgetforge::GenerationRequest;

fn service(
    remote: StubRemote,
    structured: bool,
    sleeper: Arc<InstantSleeper>,
    sink: Arc<dyn ArtifactSink>,
) -> GenerationService {
    let executor = RetryExecutor::new(Arc::new(RetryConfig::default())).with_sleeper(sleeper);
    GenerationService::new(
        "gemini",
        "GeminiGeneratedWidget",
        structured,
        Arc::new(remote),
        executor,
        sink,
    )
}

#[tokio::test]
async fn test_overloaded_provider_falls_back_after_retries() {
    let sleeper = Arc::new(InstantSleeper::default());
    let sink = Arc::new(MemorySink::default());
    let service = service(StubRemote::Overloaded, true, sleeper.clone(), sink.clone());

    let request = GenerationRequest::new("a login form", "LoginForm").unwrap();
    let result = service.generate(&request).await.unwrap();

    assert!(!result.success);
    let error = result.error.as_deref().unwrap();
    assert!(error.contains("after"), "error was: {}", error);
    assert!(error.contains("503"));
    assert_eq!(result.code, get_fallback("any reason", "LoginForm").code);
    assert!(result.aux_structure.is_some());
    assert_eq!(sleeper.delays.lock().len(), 2);

    // The fallback is still persisted.
    let writes = sink.writes.lock();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "LoginForm");
}

#[tokio::test]
async fn test_rate_limited_backoff_waits_longer() {
    let sleeper = Arc::new(InstantSleeper::default());
    let service = service(
        StubRemote::RateLimited,
        true,
        sleeper.clone(),
        Arc::new(MemorySink::default()),
    );
    let request = GenerationRequest::new("a card", "InfoCard").unwrap();
    let result = service.generate(&request).await.unwrap();

    assert!(!result.success);
    let delays = sleeper.delays.lock();
    assert_eq!(delays.len(), 2);
    // Rate limits start from a 5 second base.
    assert!(delays[0].as_secs_f64() >= 5.0);
}

#[tokio::test]
async fn test_fenced_dart_is_repaired_and_renamed() {
    let raw = "```dart\nimport 'package: flutter/material.dart';\n\nclass Foo extends StatelessWidget {\nconst Foo({super.key});\n\n@override\nWidget build(BuildContext context) {\nreturn const Text('hello');\n}\n}\n```";
    let sink = Arc::new(MemorySink::default());
    let service = service(
        StubRemote::Reply(raw.to_string()),
        false,
        Arc::new(InstantSleeper::default()),
        sink.clone(),
    );

    let request = GenerationRequest::new("a greeting", "Bar").unwrap();
    let result = service.generate(&request).await.unwrap();

    assert!(result.success);
    assert!(result.error.is_none());
    assert!(result.code.contains("import 'package:flutter/material.dart';"));
    assert!(result.code.contains("class Bar extends StatelessWidget"));
    assert!(!result.code.contains("```"));
    assert!(!result.code.contains("Foo"));
    assert_eq!(sink.writes.lock()[0].1, result.code);
}

#[tokio::test]
async fn test_structured_payload_with_python_literal() {
    let raw = "Sure! {'code': 'class MyWidget extends StatelessWidget {\\n}', 'ui_json': {'type': 'Column', 'children': []}}";
    let service = service(
        StubRemote::Reply(raw.to_string()),
        true,
        Arc::new(InstantSleeper::default()),
        Arc::new(MemorySink::default()),
    );
    let request = GenerationRequest::new("a column", "GeminiGeneratedWidget").unwrap();
    let result = service.generate(&request).await.unwrap();

    assert!(result.success);
    assert!(result.code.contains("class GeminiGeneratedWidget extends StatelessWidget"));
    assert_eq!(result.aux_structure.unwrap()["type"], "Column");
}

#[tokio::test]
async fn test_sink_failure_does_not_change_success() {
    let raw = "class MyWidget extends StatelessWidget {\n}";
    let service = service(
        StubRemote::Reply(raw.to_string()),
        false,
        Arc::new(InstantSleeper::default()),
        Arc::new(BrokenSink),
    );
    let request = GenerationRequest::new("x", "Bar").unwrap();
    let result = service.generate(&request).await.unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn test_garbage_payload_falls_back_with_parse_error() {
    let service = service(
        StubRemote::Reply("I cannot help with that.".to_string()),
        true,
        Arc::new(InstantSleeper::default()),
        Arc::new(MemorySink::default()),
    );
    let request = GenerationRequest::new("x", "Bar").unwrap();
    let result = service.generate(&request).await.unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("Parsing error"));
    assert!(result.code.contains("class Bar extends StatelessWidget"));
}
