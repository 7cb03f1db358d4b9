mod support;

use std::time::Duration;

use apiprobe::config::EngineConfig;
use apiprobe::domain::ProbeRequest;
use apiprobe::engine::{ProbeContext, ProbeEngine};

use support::{
    StubResponse, run_async_test, spawn_raw_server_or_skip, spawn_stub_server_or_skip,
    test_config,
};

fn engine_with(config: EngineConfig) -> Result<ProbeEngine, String> {
    ProbeEngine::new(config).map_err(|err| err.to_string())
}

#[test]
fn successful_probe_captures_status_body_and_headers() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| {
        StubResponse::status(200)
            .with_body("hello")
            .with_header("X-Stub", "yes")
    })?
    else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let request = ProbeRequest::new("GET", format!("{}/health", server.url))
            .with_endpoint_id("ep-health");
        let request_id = request.id.clone();
        let outcome = engine.execute_one(request, &ProbeContext::new()).await;

        if !outcome.success() || outcome.status_code() != 200 {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        if outcome.body() != b"hello" || outcome.error().is_some() {
            return Err(format!("Unexpected body/error: {:?}", outcome));
        }
        if outcome.headers().get("x-stub").map(String::as_str) != Some("yes") {
            return Err(format!("Response header missing: {:?}", outcome.headers()));
        }
        if outcome.request_id() != request_id || outcome.endpoint_id() != "ep-health" {
            return Err("Identifiers not carried into the outcome".to_owned());
        }
        if outcome.retry_count() != 0 || outcome.elapsed().is_zero() {
            return Err(format!("Unexpected retry/elapsed: {:?}", outcome));
        }
        Ok(())
    })
}

#[test]
fn not_found_is_not_retried() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| StubResponse::status(404))? else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let request = ProbeRequest::new("GET", server.url.clone()).with_max_retries(2);
        let outcome = engine.execute_one(request, &ProbeContext::new()).await;
        if outcome.success() || outcome.status_code() != 404 || outcome.retry_count() != 0 {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        if server.hits() != 1 {
            return Err(format!("Expected 1 hit, got {}", server.hits()));
        }
        Ok(())
    })
}

#[test]
fn bad_request_is_not_retried() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| StubResponse::status(400))? else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let outcome = engine
            .execute_one(ProbeRequest::new("GET", server.url.clone()), &ProbeContext::new())
            .await;
        if outcome.retry_count() != 0 || server.hits() != 1 {
            return Err(format!("400 should not be retried: {:?}", outcome));
        }
        Ok(())
    })
}

#[test]
fn server_errors_exhaust_the_hard_cap() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| StubResponse::status(503))? else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let request = ProbeRequest::new("GET", server.url.clone()).with_max_retries(5);
        let outcome = engine.execute_one(request, &ProbeContext::new()).await;
        if outcome.success() || outcome.status_code() != 503 {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        if outcome.retry_count() != 2 || server.hits() != 3 {
            return Err(format!(
                "Expected 3 attempts and retry_count 2, got {} hits and {}",
                server.hits(),
                outcome.retry_count()
            ));
        }
        Ok(())
    })
}

#[test]
fn too_many_requests_is_retried() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| StubResponse::status(429))? else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let request = ProbeRequest::new("GET", server.url.clone()).with_max_retries(1);
        let outcome = engine.execute_one(request, &ProbeContext::new()).await;
        if outcome.retry_count() != 1 || server.hits() != 2 {
            return Err(format!("429 should be retried once: {:?}", outcome));
        }
        Ok(())
    })
}

#[test]
fn body_is_truncated_at_the_cap() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| StubResponse::status(200).with_body(vec![b'x'; 1000]))? else {
        return Ok(());
    };
    run_async_test(async move {
        let config = EngineConfig {
            max_response_size: 100,
            ..test_config()
        };
        let engine = engine_with(config)?;
        let outcome = engine
            .execute_one(ProbeRequest::new("GET", server.url.clone()), &ProbeContext::new())
            .await;
        if outcome.body().len() != 100 {
            return Err(format!("Expected 100 bytes, got {}", outcome.body().len()));
        }
        if !outcome.success() || outcome.error().is_some() {
            return Err(format!("Truncation must not be an error: {:?}", outcome));
        }
        Ok(())
    })
}

#[test]
fn construction_failures_are_terminal() -> Result<(), String> {
    run_async_test(async {
        let engine = engine_with(test_config())?;
        let ctx = ProbeContext::new();
        let cases = [
            ProbeRequest::new("GET", "::not a url::"),
            ProbeRequest::new("BAD METHOD", "http://127.0.0.1:9/"),
            ProbeRequest::new("GET", "ftp://127.0.0.1/file"),
            ProbeRequest::new("GET", "http://127.0.0.1:9/").with_header("Bad Header", "x"),
        ];
        for request in cases {
            let outcome = engine.execute_one(request, &ctx).await;
            if outcome.status_code() != 0 || outcome.success() || outcome.retry_count() != 0 {
                return Err(format!("Unexpected outcome: {:?}", outcome));
            }
            if outcome.error().is_none() {
                return Err("Construction failure must carry error text".to_owned());
            }
        }
        let snapshot = engine.metrics_snapshot();
        if snapshot.get("failed_tests") != Some(&4) {
            return Err(format!("Construction failures must be recorded: {:?}", snapshot));
        }
        Ok(())
    })
}

#[test]
fn cancelled_context_skips_io() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| StubResponse::status(200))? else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let ctx = ProbeContext::new();
        ctx.cancel();
        let outcome = engine
            .execute_one(ProbeRequest::new("GET", server.url.clone()), &ctx)
            .await;
        if outcome.status_code() != 0 || outcome.success() {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        match outcome.error() {
            Some(text) if text.contains("cancelled") => {}
            other => return Err(format!("Expected cancellation text, got {:?}", other)),
        }
        if server.hits() != 0 {
            return Err("Cancelled probe reached the server".to_owned());
        }
        Ok(())
    })
}

#[test]
fn slow_response_times_out_and_is_retried() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| {
        StubResponse::status(200).with_delay(Duration::from_millis(600))
    })?
    else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let request = ProbeRequest::new("GET", server.url.clone())
            .with_timeout(Duration::from_millis(100))
            .with_max_retries(1);
        let outcome = engine.execute_one(request, &ProbeContext::new()).await;
        if outcome.status_code() != 0 || outcome.retry_count() != 1 {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        match outcome.error() {
            Some(text) if text.to_lowercase().contains("timeout") => {}
            other => return Err(format!("Expected timeout text, got {:?}", other)),
        }
        if outcome.elapsed() > Duration::from_millis(500) {
            return Err(format!("Attempt overran its deadline: {:?}", outcome.elapsed()));
        }
        Ok(())
    })
}

#[test]
fn context_deadline_bounds_the_attempt() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| {
        StubResponse::status(200).with_delay(Duration::from_millis(800))
    })?
    else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let ctx = ProbeContext::new().with_timeout(Duration::from_millis(150));
        let start = std::time::Instant::now();
        let outcome = engine
            .execute_one(ProbeRequest::new("GET", server.url.clone()), &ctx)
            .await;
        if outcome.success() || start.elapsed() > Duration::from_millis(700) {
            return Err(format!(
                "Deadline not honoured after {:?}: {:?}",
                start.elapsed(),
                outcome
            ));
        }
        Ok(())
    })
}

#[test]
fn cancel_during_backoff_returns_last_outcome() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|_| StubResponse::status(503))? else {
        return Ok(());
    };
    run_async_test(async move {
        let config = EngineConfig {
            retry_delay: Duration::from_secs(5),
            max_retry_delay: Duration::from_secs(5),
            ..test_config()
        };
        let engine = engine_with(config)?;
        let ctx = ProbeContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            canceller.cancel();
        });
        let start = std::time::Instant::now();
        let request = ProbeRequest::new("GET", server.url.clone()).with_max_retries(2);
        let outcome = engine.execute_one(request, &ctx).await;
        if start.elapsed() > Duration::from_secs(2) {
            return Err(format!("Backoff ignored cancellation: {:?}", start.elapsed()));
        }
        if outcome.status_code() != 503 || outcome.retry_count() != 0 {
            return Err(format!("Expected the first 503 outcome, got {:?}", outcome));
        }
        if server.hits() != 1 {
            return Err(format!("Expected 1 hit, got {}", server.hits()));
        }
        Ok(())
    })
}

#[test]
fn short_body_keeps_status_and_partial_bytes() -> Result<(), String> {
    let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nonly-ten!!".to_vec();
    let Some(server) = spawn_raw_server_or_skip(raw)? else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let outcome = engine
            .execute_one(ProbeRequest::new("GET", server.url.clone()), &ProbeContext::new())
            .await;
        if outcome.status_code() != 200 || !outcome.success() {
            return Err(format!("Status not kept after body failure: {:?}", outcome));
        }
        if outcome.body() != b"only-ten!!" {
            return Err(format!(
                "Partial body lost: {:?}",
                String::from_utf8_lossy(outcome.body())
            ));
        }
        match outcome.error() {
            Some(text) if text.starts_with("Failed to read response body") => {}
            other => return Err(format!("Expected body read error, got {:?}", other)),
        }
        if outcome.retry_count() != 0 {
            return Err(format!("Body failure should not retry: {:?}", outcome));
        }
        Ok(())
    })
}

#[test]
fn post_body_and_headers_reach_the_server() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|request| {
        let echoed = request.header("x-trace").unwrap_or_default().to_owned();
        if request.method == "POST" && request.body == b"{\"a\":1}" {
            StubResponse::status(201).with_header("X-Echo", &echoed)
        } else {
            StubResponse::status(400)
        }
    })?
    else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let request = ProbeRequest::new("post", format!("{}/items", server.url))
            .with_header("X-Trace", "trace-1")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"a":1}"#);
        let outcome = engine.execute_one(request, &ProbeContext::new()).await;
        if outcome.status_code() != 201 || !outcome.success() {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        if outcome.headers().get("x-echo").map(String::as_str) != Some("trace-1") {
            return Err(format!("Header not forwarded: {:?}", outcome.headers()));
        }
        Ok(())
    })
}

#[test]
fn redirects_follow_the_request_flag() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|request| {
        if request.path == "/start" {
            StubResponse::status(302).with_header("Location", "/final")
        } else {
            StubResponse::status(200).with_body("final")
        }
    })?
    else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let url = format!("{}/start", server.url);

        let followed = engine
            .execute_one(ProbeRequest::new("GET", url.clone()), &ProbeContext::new())
            .await;
        if followed.status_code() != 200 || followed.body() != b"final" {
            return Err(format!("Redirect not followed: {:?}", followed));
        }

        let direct = engine
            .execute_one(
                ProbeRequest::new("GET", url).with_follow_redirects(false),
                &ProbeContext::new(),
            )
            .await;
        if direct.status_code() != 302 || direct.success() || direct.retry_count() != 0 {
            return Err(format!("Redirect should be returned as-is: {:?}", direct));
        }
        Ok(())
    })
}

#[test]
fn default_user_agent_is_sent() -> Result<(), String> {
    let Some(server) = spawn_stub_server_or_skip(|request| {
        let agent = request.header("user-agent").unwrap_or_default().to_owned();
        StubResponse::status(200).with_body(agent)
    })?
    else {
        return Ok(());
    };
    run_async_test(async move {
        let engine = engine_with(test_config())?;
        let outcome = engine
            .execute_one(ProbeRequest::new("GET", server.url.clone()), &ProbeContext::new())
            .await;
        let agent = String::from_utf8_lossy(outcome.body()).into_owned();
        if !agent.starts_with("apiprobe/") {
            return Err(format!("Unexpected user agent '{}'", agent));
        }
        Ok(())
    })
}

#[test]
fn unreachable_host_reports_transport_failure() -> Result<(), String> {
    run_async_test(async {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")
            .map_err(|err| format!("bind failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("addr failed: {}", err))?;
        drop(listener);

        let engine = engine_with(test_config())?;
        let outcome = engine
            .execute_one(
                ProbeRequest::new("GET", format!("http://{}/", addr)),
                &ProbeContext::new(),
            )
            .await;
        if outcome.status_code() != 0 || outcome.success() || outcome.error().is_none() {
            return Err(format!("Unexpected outcome: {:?}", outcome));
        }
        Ok(())
    })
}
