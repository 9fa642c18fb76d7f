use std::io;
use std::sync::{Arc, Mutex};

use cinema_seating::config::{CdsConfig, CircuitBreakerConfig};
use cinema_seating::error::CdsError;
use cinema_seating::services::cds::CineDigitalServiceClient;
use cinema_seating::services::circuit_breaker::CircuitState;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CINEMA_ID: &str = "test_id";
const TOKEN: &str = "token_test";

fn client(server: &MockServer, failure_threshold: u32) -> CineDigitalServiceClient {
    let cds = CdsConfig {
        cinema_id: CINEMA_ID.to_string(),
        account_id: "accountid_test".to_string(),
        api_token: TOKEN.to_string(),
        api_url: "apiUrl_test/".to_string(),
        request_timeout_seconds: 5,
    };
    let breaker = CircuitBreakerConfig {
        failure_threshold,
        timeout_seconds: 60,
    };
    CineDigitalServiceClient::from_config(&cds, &breaker)
        .unwrap()
        .with_base_url(server.uri())
}

async fn mock_get(server: &MockServer, resource: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(resource))
        .and(query_param("api_token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn show(id: i64, disable_seatmap: bool) -> Value {
    json!({
        "id": id,
        "remaining_place": 88,
        "internet_remaining_place": 1,
        "disableseatmap": disable_seatmap,
        "showtime": "2022-03-28T12:00:00.000+0200",
        "is_cancelled": false,
        "is_deleted": false,
        "showsTariffPostypeCollection": [{"tariffid": {"id": 96}}],
        "screenid": {"id": 10},
        "mediaid": {"id": 52},
        "showsMediaoptionsCollection": []
    })
}

fn screen() -> Value {
    json!([{
        "id": 10,
        "seatmapfronttoback": true,
        "seatmaplefttoright": true,
        "seatmapskipmissingseats": false
    }])
}

fn cinema(parameters: Value) -> Value {
    json!([{
        "id": CINEMA_ID,
        "internetsalegaugeactive": false,
        "cinemaParameters": parameters
    }])
}

async fn mock_booking_references(server: &MockServer, show: Value) {
    mock_get(server, "/paiementtype", json!([{"id": 21, "active": true, "internalcode": "VCH"}])).await;
    mock_get(server, "/shows", json!([show])).await;
    mock_get(server, "/vouchertype", voucher_types()).await;
    mock_get(server, "/screens", screen()).await;
    mock_get(server, "/cinemas", cinema(json!([]))).await;
}

fn voucher_types() -> Value {
    json!([
        {"id": 3, "code": "PSCULTURE", "tariffid": {"id": 96, "price": 5.0, "active": true, "labeltariff": "pass Culture"}},
        {"id": 4, "code": "PSCULTURE", "tariffid": {"id": 42, "price": 3.5, "active": true, "labeltariff": "other show"}},
        {"id": 5, "code": "OTHER", "tariffid": {"id": 96, "price": 1.0, "active": true, "labeltariff": "not pass Culture"}}
    ])
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

/// Пишет вывод `tracing` в общий буфер.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

async fn posted_transaction(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let request = requests
        .iter()
        .find(|r| r.url.path() == "/transaction/create")
        .unwrap();
    serde_json::from_slice(&request.body).unwrap()
}

#[tokio::test]
async fn get_show_selects_by_id() {
    let server = MockServer::start().await;
    mock_get(&server, "/shows", json!([show(1, false), show(2, true)])).await;
    let client = client(&server, 5);

    let found = client.get_show(2).await.unwrap();
    assert_eq!(found.id, 2);
    assert!(!found.has_seatmap());

    let err = client.get_show(3).await.unwrap_err();
    assert!(matches!(err, CdsError::ShowNotFound { show_id: 3, .. }));
}

#[tokio::test]
async fn missing_screen_names_cinema_and_url() {
    let server = MockServer::start().await;
    mock_get(&server, "/screens", screen()).await;
    let client = client(&server, 5);

    let err = client.get_screen(4).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Screen #4 not found in Cine Digital Service API for cinemaId={} & url={}/",
            CINEMA_ID,
            server.uri()
        )
    );
}

#[tokio::test]
async fn missing_payment_type_is_an_error() {
    let server = MockServer::start().await;
    mock_get(&server, "/paiementtype", json!([{"id": 1, "active": true, "internalcode": "CB"}])).await;
    let client = client(&server, 5);

    let err = client.get_voucher_payment_type().await.unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Pass Culture payment type not found in Cine Digital Service API for cinemaId=test_id"));
}

#[tokio::test]
async fn cheapest_voucher_offered_by_the_show_wins() {
    let server = MockServer::start().await;
    mock_booking_references(&server, show(1, false)).await;
    let client = client(&server, 5);

    let show = client.get_show(1).await.unwrap();
    let voucher = client.get_voucher_type_for_show(&show).await.unwrap().unwrap();
    assert_eq!(voucher.id, 3);
    assert_eq!(client.get_pc_voucher_types().await.unwrap().len(), 2);
}

#[tokio::test]
async fn hardcoded_labels_come_from_cinema_parameters() {
    let server = MockServer::start().await;
    let table = json!([
        ["P_17", "P_15", "P_13", "P_11", "P_9", "P_7", "P_5", "P_3", "P_1"],
        ["M_17", "M_15", "M_13", "M_11", "M_9", "M_7", "M_5", "M_3", "M_1"],
        ["O_17", "O_15", "O_13", "O_11", "O_9", "O_7", "O_5", "O_3", "O_1"]
    ]);
    mock_get(
        &server,
        "/cinemas",
        cinema(json!([
            {"key": "SEATMAP_HARDCODED_LABELS_SCREENID_10", "value": table.to_string()},
            {"key": "SEATMAP_HARDCODED_LABELS_SCREENID_11", "value": "[]"}
        ])),
    )
    .await;
    mock_get(&server, "/shows/1/seatmap", json!([
            [1, 1, 1, 1, 1, 1, 0, 1, 1],
            [1, 1, 1, 1, 1, 1, 0, 1, 1],
            [1, 1, 1, 1, 1, 1, 0, 1, 1]
        ])).await;
    mock_get(&server, "/shows", json!([show(1, false)])).await;
    mock_get(&server, "/screens", screen()).await;
    let client = client(&server, 5);

    assert!(client.get_hardcoded_seatmap(11).await.unwrap().is_none());
    assert!(client.get_hardcoded_seatmap(12).await.unwrap().is_none());

    let show = client.get_show(1).await.unwrap();
    let screen = client.get_screen(10).await.unwrap();
    let seat = client.get_available_seat(&show, &screen).await.unwrap().unwrap();
    assert_eq!((seat.seat_row, seat.seat_col), (1, 4));
    assert_eq!(seat.seat_number, "M_9");
}

#[tokio::test]
async fn books_a_duo_next_to_each_other() {
    let server = MockServer::start().await;
    mock_booking_references(&server, show(1, false)).await;
    mock_get(
        &server,
        "/shows/1/seatmap",
        json!([
            [1, 1, 1, 1, 0, 1],
            [1, 1, 1, 3, 0, 1],
            [1, 1, 3, 3, 0, 1],
            [1, 1, 3, 1, 0, 1],
            [1, 1, 1, 1, 0, 1]
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/transaction/create"))
        .and(query_param("api_token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "invoiceid": "2",
            "tickets": [
                {"barcode": "141414141414", "seatnumber": "B_2"},
                {"barcode": "151515151515", "seatnumber": "B_3"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client(&server, 5);

    let tickets = client.book_ticket(1, 2).await.unwrap();
    let barcodes: Vec<_> = tickets.iter().map(|t| t.barcode.as_str()).collect();
    assert_eq!(barcodes, vec!["141414141414", "151515151515"]);
    assert_eq!(tickets[0].seat_number.as_deref(), Some("B_2"));

    let body = posted_transaction(&server).await;
    assert_eq!(body["cinemaid"], CINEMA_ID);
    assert_eq!(body["canceled"], false);

    let sales = body["ticketsaleCollection"].as_array().unwrap();
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0]["id"], -1);
    assert_eq!(sales[1]["id"], -2);
    assert_eq!(sales[0]["seatnumber"], "B_2");
    assert_eq!(sales[0]["seatrow"], 1);
    assert_eq!(sales[0]["seatcol"], 1);
    assert_eq!(sales[1]["seatnumber"], "B_3");
    assert_eq!(sales[1]["seatcol"], 2);
    assert_eq!(sales[0]["tariffid"], json!({"id": 96}));
    assert_eq!(sales[0]["showid"], json!({"id": 1}));
    assert_eq!(sales[0]["vouchertype"], "PSCULTURE");
    assert_eq!(sales[0]["disabledperson"], false);

    let payments = body["paiementCollection"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[1]["id"], -2);
    assert_eq!(payments[0]["amount"], json!(5.0));
    assert_eq!(payments[0]["paiementtypeid"], json!({"id": 21}));
    assert_eq!(payments[0]["vouchertypeid"], json!({"id": 3}));
}

#[tokio::test]
async fn disabled_seatmap_books_without_seats() {
    let server = MockServer::start().await;
    mock_booking_references(&server, show(1, true)).await;
    Mock::given(method("POST"))
        .and(path("/transaction/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "invoiceid": "2",
            "tickets": [{"barcode": "141414141414"}]
        })))
        .mount(&server)
        .await;
    let client = client(&server, 5);

    let tickets = client.book_ticket(1, 1).await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].seat_number, None);

    let body = posted_transaction(&server).await;
    let sale = &body["ticketsaleCollection"][0];
    assert_eq!(sale["seatrow"], Value::Null);
    assert_eq!(sale["seatcol"], Value::Null);
    assert_eq!(sale["seatnumber"], Value::Null);
}

#[tokio::test]
async fn disabled_seatmap_leaves_availability_to_the_provider() {
    let server = MockServer::start().await;
    let mut show = show(1, true);
    show["internet_remaining_place"] = json!(0);
    show["remaining_place"] = json!(0);
    mock_get(&server, "/paiementtype", json!([{"id": 21, "active": true, "internalcode": "VCH"}])).await;
    mock_get(&server, "/shows", json!([show])).await;
    mock_get(&server, "/vouchertype", voucher_types()).await;
    mock_get(
        &server,
        "/cinemas",
        json!([{"id": CINEMA_ID, "internetsalegaugeactive": true, "cinemaParameters": []}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/transaction/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "invoiceid": "2",
            "tickets": [{"barcode": "141414141414"}, {"barcode": "151515151515"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client(&server, 5);

    let tickets = client.book_ticket(1, 2).await.unwrap();
    assert_eq!(tickets.len(), 2);

    let paths = requested_paths(&server).await;
    assert!(paths.iter().any(|p| p == "/transaction/create"));
    assert!(!paths.iter().any(|p| p == "/cinemas" || p == "/screens"));

    let body = posted_transaction(&server).await;
    assert_eq!(body["ticketsaleCollection"].as_array().unwrap().len(), 2);
    assert_eq!(body["ticketsaleCollection"][1]["seatnumber"], Value::Null);
}

#[tokio::test]
async fn sold_out_show_is_not_booked() {
    let server = MockServer::start().await;
    mock_booking_references(&server, show(1, false)).await;
    mock_get(&server, "/shows/1/seatmap", json!([[3, 3, 0, 3], [3, 2, 0, 11]])).await;
    Mock::given(method("POST"))
        .and(path("/transaction/create"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = client(&server, 5);

    let err = client.book_ticket(1, 1).await.unwrap_err();
    assert!(matches!(err, CdsError::NotEnoughSeats { remaining_quantity: 0 }));

    let err = client.book_ticket(1, 2).await.unwrap_err();
    assert!(matches!(err, CdsError::NotEnoughSeats { remaining_quantity: 0 }));
}

#[tokio::test]
async fn malformed_seatmap_fails_loudly() {
    let server = MockServer::start().await;
    mock_get(&server, "/shows/1/seatmap", json!([[1, 1, 1], [1, 1]])).await;
    let client = client(&server, 5);

    let err = client.get_seatmap(1).await.unwrap_err();
    assert!(matches!(err, CdsError::Seatmap(_)));
}

#[tokio::test]
async fn cancel_lists_every_barcode_on_error() {
    let server = MockServer::start().await;
    mock_get(&server, "/paiementtype", json!([{"id": 21, "active": true, "internalcode": "VCH"}])).await;
    Mock::given(method("PUT"))
        .and(path("/transaction/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "111111111111": "BARCODE_NOT_FOUND",
            "222222222222": "TICKET_ALREADY_CANCELED",
            "333333333333": "AFTER_END_OF_DAY",
            "444444444444": "AFTER_END_OF_SHOW",
            "555555555555": "DAY_CLOSED"
        })))
        .mount(&server)
        .await;
    let client = client(&server, 5);

    let barcodes: Vec<String> = ["111111111111", "222222222222", "333333333333", "444444444444", "555555555555"]
        .iter()
        .map(|b| b.to_string())
        .collect();
    let err = client.cancel_booking(&barcodes).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error while canceling bookings :\n111111111111 : BARCODE_NOT_FOUND\n222222222222 : TICKET_ALREADY_CANCELED\n333333333333 : AFTER_END_OF_DAY\n444444444444 : AFTER_END_OF_SHOW\n555555555555 : DAY_CLOSED"
    );

    let requests = server.received_requests().await.unwrap();
    let request = requests.iter().find(|r| r.url.path() == "/transaction/cancel").unwrap();
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["paiementtypeid"], 21);
    assert_eq!(body["barcodes"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn cancel_errors_keep_provider_order() {
    let server = MockServer::start().await;
    mock_get(&server, "/paiementtype", json!([{"id": 21, "active": true, "internalcode": "VCH"}])).await;
    Mock::given(method("PUT"))
        .and(path("/transaction/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"333333333333": "AFTER_END_OF_DAY", "111111111111": "BARCODE_NOT_FOUND", "222222222222": "DAY_CLOSED"}"#,
        ))
        .mount(&server)
        .await;
    let client = client(&server, 5);

    let barcodes = vec![
        "333333333333".to_string(),
        "111111111111".to_string(),
        "222222222222".to_string(),
    ];
    let err = client.cancel_booking(&barcodes).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error while canceling bookings :\n333333333333 : AFTER_END_OF_DAY\n111111111111 : BARCODE_NOT_FOUND\n222222222222 : DAY_CLOSED"
    );
}

#[tokio::test]
async fn already_cancelled_tickets_are_fine() {
    let server = MockServer::start().await;
    mock_get(&server, "/paiementtype", json!([{"id": 21, "active": true, "internalcode": "VCH"}])).await;
    Mock::given(method("PUT"))
        .and(path("/transaction/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "111111111111": "TICKET_ALREADY_CANCELED",
            "222222222222": "TICKET_ALREADY_CANCELED"
        })))
        .mount(&server)
        .await;
    let client = client(&server, 5);

    let barcodes = vec!["111111111111".to_string(), "222222222222".to_string()];
    client.cancel_booking(&barcodes).await.unwrap();
}

#[tokio::test]
async fn provider_errors_open_the_circuit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shows"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let client = client(&server, 1);

    let err = client.get_show(1).await.unwrap_err();
    assert!(matches!(err, CdsError::Http(_)));
    assert_eq!(client.circuit_breaker_status().0, CircuitState::Open);

    let err = client.get_show(1).await.unwrap_err();
    assert!(matches!(err, CdsError::CircuitOpen));
}

#[tokio::test]
async fn lists_every_movie_of_the_venue() {
    let server = MockServer::start().await;
    mock_get(
        &server,
        "/media",
        json!([
            {"id": 1, "title": "Test movie #1", "duration": 7200, "storyline": "Test description #1", "visanumber": "123"},
            {"id": 2, "title": "Test movie #2", "duration": 5400, "storyline": "Test description #2", "visanumber": "456"},
            {"id": 2, "title": "Test movie #2", "duration": 5400, "storyline": "Test description #2"}
        ]),
    )
    .await;
    let client = client(&server, 5);

    let movies = client.get_venue_movies().await.unwrap();
    assert_eq!(movies.len(), 3);
    assert_eq!(movies[0].title, "Test movie #1");
    assert_eq!(movies[1].visa_number.as_deref(), Some("456"));
    assert_eq!(movies[2].visa_number, None);
}

#[tokio::test]
async fn provider_calls_are_logged_without_token() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    mock_get(&server, "/shows", json!([show(1, false)])).await;
    let client = client(&server, 5);
    client.get_show(1).await.unwrap();

    let output = logs.contents();
    let line = output
        .lines()
        .find(|line| line.contains("[CINEMA] Call to external API"))
        .unwrap();
    assert!(line.contains("DEBUG"));
    assert!(line.contains(r#"api_client="CineDigitalServiceAPI""#));
    assert!(line.contains(&format!("method=GET {}/shows", server.uri())));
    assert!(line.contains(&format!("cinema_id={}", CINEMA_ID)));
    assert!(line.contains("response="));
    assert!(!line.contains("api_token"));
    assert!(!line.contains(TOKEN));
}
