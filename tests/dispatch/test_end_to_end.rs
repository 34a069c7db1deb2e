//! Full cycle over HTTP: Sheets catalog → Telegram channel → status write

use std::sync::Arc;

use httpmock::prelude::*;
use promo_dispatch::catalog::sheets::SheetsCatalog;
use promo_dispatch::google_auth::StaticToken;
use promo_dispatch::{run_once, DispatchOutcome, TelegramChannel};
use reqwest::Client;

const SHEET_ID: &str = "sheet-e2e";

fn header() -> serde_json::Value {
    serde_json::json!([
        "NOME", "VALOR_ANTIGO", "VALOR_PROMO", "CUPOM", "FRASE", "IMAGEM", "LINK", "STATUS"
    ])
}

fn tenis_row(status: &str) -> serde_json::Value {
    serde_json::json!([
        "Tênis X", "R$200", "R$99", "FROG10", "Corre!", "http://img.test/tenis.jpg",
        "http://x.test/a", status
    ])
}

fn wire(server: &MockServer) -> (SheetsCatalog, TelegramChannel) {
    let http = Client::new();
    let catalog = SheetsCatalog::new(http.clone(), Arc::new(StaticToken("tok".into())), SHEET_ID)
        .expect("catalog")
        .with_base_url(server.base_url());
    let channel = TelegramChannel::new(http, "42:token", "@promo_channel")
        .expect("channel")
        .with_base_url(server.base_url());
    (catalog, channel)
}

#[tokio::test]
async fn pending_row_is_posted_as_photo_and_marked_sent() {
    let server = MockServer::start_async().await;

    let snapshot = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/v4/spreadsheets/{}/values/A:Z", SHEET_ID));
        then.status(200)
            .json_body(serde_json::json!({ "values": [header(), tenis_row("")] }));
    });
    let row = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/v4/spreadsheets/{}/values/A2:H2", SHEET_ID));
        then.status(200)
            .json_body(serde_json::json!({ "values": [tenis_row("")] }));
    });
    let photo = server.mock(|when, then| {
        when.method(POST)
            .path("/bot42:token/sendPhoto")
            .is_true(|req| {
                let body = String::from_utf8_lossy(req.body().as_ref());
                body.contains("\"photo\":\"http://img.test/tenis.jpg\"")
                    && body.contains("<s>R$200</s>")
                    && body.contains("FROG10")
            });
        then.status(200)
            .json_body(serde_json::json!({ "ok": true, "result": { "message_id": 1 } }));
    });
    let write = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("/v4/spreadsheets/{}/values/H2", SHEET_ID))
            .query_param("valueInputOption", "RAW");
        then.status(200).json_body(serde_json::json!({ "updatedCells": 1 }));
    });

    let (catalog, channel) = wire(&server);
    let result = run_once(&catalog, &channel).await.expect("cycle");

    assert_eq!(result.outcome, DispatchOutcome::Sent);
    snapshot.assert_calls(1);
    row.assert_calls(1);
    photo.assert_calls(1);
    write.assert_calls(1);
}

#[tokio::test]
async fn rejected_post_never_touches_the_sheet() {
    let server = MockServer::start_async().await;

    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/v4/spreadsheets/{}/values/A:Z", SHEET_ID));
        then.status(200)
            .json_body(serde_json::json!({ "values": [header(), tenis_row("")] }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/bot42:token/sendPhoto");
        then.status(403).json_body(serde_json::json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot is not a member of the channel chat"
        }));
    });
    let write = server.mock(|when, then| {
        when.method(PUT);
        then.status(200);
    });

    let (catalog, channel) = wire(&server);
    let result = run_once(&catalog, &channel).await.expect("cycle");

    assert_eq!(result.outcome, DispatchOutcome::DeliveryFailed);
    assert!(result.error.unwrap().contains("not a member"));
    write.assert_calls(0);
}

#[tokio::test]
async fn fully_sent_sheet_makes_no_telegram_calls() {
    let server = MockServer::start_async().await;

    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/v4/spreadsheets/{}/values/A:Z", SHEET_ID));
        then.status(200)
            .json_body(serde_json::json!({ "values": [header(), tenis_row("ENVIADO")] }));
    });
    let telegram = server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(serde_json::json!({ "ok": true }));
    });

    let (catalog, channel) = wire(&server);
    let result = run_once(&catalog, &channel).await.expect("cycle");

    assert_eq!(result.outcome, DispatchOutcome::NothingPending);
    telegram.assert_calls(0);
}
