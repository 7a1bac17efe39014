//! End-to-end tests of the CalDAV operations over `HttpTransport`.

use chrono::{Duration, TimeZone, Utc};
use ical_booker_caldav::{
    CalDavErrorCode, HttpConfig, HttpTransport, create_booking, discover_calendars,
    get_busy_events,
};
use ical_booker_core::{Credentials, NewEvent, TimeWindow};
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// base64("me@example.com:app-pass")
const AUTH: &str = "Basic bWVAZXhhbXBsZS5jb206YXBwLXBhc3M=";

fn transport() -> HttpTransport {
    HttpTransport::new(&HttpConfig::new().with_timeout(std::time::Duration::from_secs(5))).unwrap()
}

fn creds(server: &MockServer) -> Credentials {
    Credentials::parse(server.uri(), "me@example.com", "app-pass").unwrap()
}

async fn mount_discovery(server: &MockServer) {
    Mock::given(method("PROPFIND"))
        .and(path("/"))
        .and(header("Depth", "0"))
        .and(header("Authorization", AUTH))
        .and(body_string_contains("current-user-principal"))
        .respond_with(ResponseTemplate::new(207).set_body_string(
            r#"<?xml version="1.0"?><D:multistatus xmlns:D="DAV:"><D:response><D:href>/</D:href><D:propstat><D:prop><D:current-user-principal><D:href>/123/principal/</D:href></D:current-user-principal></D:prop></D:propstat></D:response></D:multistatus>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("PROPFIND"))
        .and(path("/123/principal/"))
        .and(header("Depth", "0"))
        .and(body_string_contains("calendar-home-set"))
        .respond_with(ResponseTemplate::new(207).set_body_string(
            r#"<?xml version="1.0"?><D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav"><D:response><D:href>/123/principal/</D:href><D:propstat><D:prop><C:calendar-home-set><D:href>/123/calendars/</D:href></C:calendar-home-set></D:prop></D:propstat></D:response></D:multistatus>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("PROPFIND"))
        .and(path("/123/calendars/"))
        .and(header("Depth", "1"))
        .and(body_string_contains("displayname"))
        .respond_with(ResponseTemplate::new(207).set_body_string(
            r#"<?xml version="1.0"?><D:multistatus xmlns:D="DAV:"><D:response><D:href>/123/calendars/</D:href><D:propstat><D:prop><D:displayname>Home</D:displayname></D:prop></D:propstat></D:response><D:response><D:href>/123/calendars/abcd-1/</D:href><D:propstat><D:prop><D:displayname>Work</D:displayname></D:prop></D:propstat></D:response></D:multistatus>"#,
        ))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn discover_over_http() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;

    let calendars = discover_calendars(&transport(), &creds(&server)).await.unwrap();

    assert_eq!(calendars.len(), 1);
    assert_eq!(calendars[0].display_name, "Work");
    assert_eq!(
        calendars[0].url.as_str(),
        format!("{}/123/calendars/abcd-1/", server.uri())
    );
}

#[tokio::test]
async fn busy_over_http() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;

    let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:a\r\nDTSTART:20250205T100000Z\r\nDTEND:20250205T110000Z\r\nSUMMARY:Planning\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let body = format!(
        r#"<?xml version="1.0"?><D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav"><D:response><D:href>/123/calendars/abcd-1/a.ics</D:href><D:propstat><D:prop><C:calendar-data>{ics}</C:calendar-data></D:prop></D:propstat></D:response></D:multistatus>"#
    );

    Mock::given(method("REPORT"))
        .and(path("/123/calendars/abcd-1/"))
        .and(header("Depth", "1"))
        .and(header("Authorization", AUTH))
        .and(body_string_contains(r#"<c:time-range start="20250201T000000Z" end="20250301T000000Z"/>"#))
        .respond_with(ResponseTemplate::new(207).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport();
    let creds = creds(&server);
    let calendars = discover_calendars(&transport, &creds).await.unwrap();
    let window = TimeWindow::new(
        Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
    );

    let busy = get_busy_events(&transport, &creds, &calendars, &window).await.unwrap();

    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].title, "Planning");
    assert_eq!(busy[0].start_iso(), "2025-02-05T10:00:00.000Z");
    assert_eq!(busy[0].end_iso(), "2025-02-05T11:00:00.000Z");
}

#[tokio::test]
async fn booking_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/123/calendars/abcd-1/\d+-[0-9a-z]+\.ics$"))
        .and(header("Content-Type", "text/calendar; charset=utf-8"))
        .and(header("Authorization", AUTH))
        .and(body_string_contains("SUMMARY:Intro call"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let calendar = Url::parse(&format!("{}/123/calendars/abcd-1", server.uri())).unwrap();
    let start = Utc.with_ymd_and_hms(2025, 2, 5, 14, 0, 0).unwrap();
    let event = NewEvent::new(start, start + Duration::minutes(30), "Intro call");

    let booking = create_booking(&transport(), &creds(&server), &calendar, &event)
        .await
        .unwrap();

    assert!(booking.url.path().starts_with("/123/calendars/abcd-1/"));
    assert!(booking.url.path().ends_with(&format!("{}.ics", booking.uid)));
}

#[tokio::test]
async fn listing_rejected_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(207).set_body_string(
            r#"<multistatus xmlns="DAV:"><response><href>/</href><propstat><prop><current-user-principal><href>/123/principal/</href></current-user-principal></prop></propstat></response></multistatus>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("PROPFIND"))
        .and(path("/123/principal/"))
        .respond_with(ResponseTemplate::new(207).set_body_string(
            r#"<multistatus xmlns="DAV:"><response><href>/123/principal/</href><propstat><prop><calendar-home-set xmlns="urn:ietf:params:xml:ns:caldav"><href xmlns="DAV:">/123/calendars/</href></calendar-home-set></prop></propstat></response></multistatus>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("PROPFIND"))
        .and(path("/123/calendars/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = discover_calendars(&transport(), &creds(&server)).await.unwrap_err();
    assert_eq!(err.code(), CalDavErrorCode::Discovery);
    assert_eq!(err.http_status(), Some(403));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let server = MockServer::start().await;
    let creds = creds(&server);
    drop(server);

    let err = discover_calendars(&transport(), &creds).await.unwrap_err();
    assert_eq!(err.code(), CalDavErrorCode::Transport);
    assert!(err.is_retryable());
}
