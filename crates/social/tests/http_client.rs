//! Tests for `ApiClient` against a one-shot local HTTP server

use social::api::{ChatApi, DirectoryApi};
use social::models::{FollowKind, NewChatMessage, NotificationId, UserId};
use social::{ApiClient, ClientError, RegistrationForm};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Serve exactly one response and hand back the raw request text
fn serve_once(status: &str, extra_headers: &[&str], body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for header in extra_headers {
        head.push_str(header);
        head.push_str("\r\n");
    }
    let response = format!("{}\r\n{}", head, body);

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut request = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some((name, value)) = line.split_once(':')
                && name.eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse().unwrap();
            }
            let end = line == "\r\n" || line.is_empty();
            request.push_str(&line);
            if end {
                break;
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();
        request.push_str(&String::from_utf8(body).unwrap());

        reader.get_mut().write_all(response.as_bytes()).unwrap();
        request
    });

    (base_url, handle)
}

#[test]
fn test_list_chats_sends_credentials_and_decodes() {
    let (base_url, server) = serve_once(
        "200 OK",
        &[],
        r#"[{"id":1,"message":"hello","sender":{"userID":1,"username":"ada"},"receiver":{"userID":2}}]"#,
    );
    let client = ApiClient::new(&base_url).unwrap();

    let messages = client.list_chats("tok.en.sig").unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /chats/get HTTP/1.1"));
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("authorization: bearer tok.en.sig"));
    assert!(lower.contains("cookie: authentication=tok.en.sig"));

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hello");
    assert_eq!(messages[0].sender.username.as_deref(), Some("ada"));
}

#[test]
fn test_error_status_carries_body() {
    let (base_url, server) = serve_once("400 Bad Request", &[], "receiver not found");
    let client = ApiClient::new(&base_url).unwrap();

    let body = NewChatMessage::new("hi", UserId(1), UserId(99));
    let err = client.send_chat("t", &body).unwrap_err();
    let request = server.join().unwrap();

    assert!(request.starts_with("POST /chats HTTP/1.1"));
    assert!(request.contains(r#""message":"hi""#));
    assert_eq!(
        err,
        ClientError::Http {
            status: 400,
            message: "receiver not found".to_string()
        }
    );
}

#[test]
fn test_empty_error_body_uses_reason() {
    let (base_url, server) = serve_once("500 Internal Server Error", &[], "");
    let client = ApiClient::new(&base_url).unwrap();

    let err = client.mark_notification_read("t", NotificationId(4)).unwrap_err();
    let request = server.join().unwrap();

    assert!(request.starts_with("POST /notifications/markAsRead/4 HTTP/1.1"));
    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
}

#[test]
fn test_bad_json_is_decode_error() {
    let (base_url, server) = serve_once("200 OK", &[], "<html>not json</html>");
    let client = ApiClient::new(&base_url).unwrap();

    let err = client.unread_notifications("t", UserId(1)).unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, ClientError::Decode { .. }));
}

#[test]
fn test_follow_queries_are_encoded() {
    let (base_url, server) = serve_once("200 OK", &[], "[]");
    let client = ApiClient::new(&base_url).unwrap();

    let follows = client.list_follows(UserId(3), FollowKind::Following).unwrap();
    let request = server.join().unwrap();

    assert!(follows.is_empty());
    assert!(request.starts_with("GET /follows?userID=3&type=following HTTP/1.1"));
}

#[test]
fn test_search_query_is_form_encoded() {
    let (base_url, server) = serve_once("200 OK", &[], r#"[{"userID":7,"username":"ada lovelace"}]"#);
    let client = ApiClient::new(&base_url).unwrap();

    let users = client.search_users("ada lovelace").unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /users/search?query=ada+lovelace HTTP/1.1"));
    assert_eq!(users[0].user_id, Some(UserId(7)));
}

#[test]
fn test_login_reads_cookie() {
    let (base_url, server) = serve_once(
        "200 OK",
        &["Set-Cookie: Authentication=Bearer%20abc.def.ghi; Path=/; HttpOnly"],
        "",
    );
    let client = ApiClient::new(&base_url).unwrap();

    let token = client.login("ada", "secret").unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("POST /login HTTP/1.1"));
    assert!(request.contains(r#""username":"ada""#));
    assert_eq!(token, "abc.def.ghi");
}

#[test]
fn test_login_without_cookie_fails() {
    let (base_url, server) = serve_once("200 OK", &[], "");
    let client = ApiClient::new(&base_url).unwrap();

    let err = client.login("ada", "secret").unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, ClientError::InvalidToken { .. }));
}

#[test]
fn test_unreachable_server_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = ApiClient::new(&base_url).unwrap();
    let err = client.get_user(UserId(1)).unwrap_err();

    assert!(matches!(err, ClientError::Network { .. }));
}

#[test]
fn test_chat_entry_with_both_body_fields_decodes() {
    let (base_url, server) = serve_once(
        "200 OK",
        &[],
        r#"[{"id":1,"message":"a","sender":{"userID":1},"receiver":{"userID":2}},
            {"id":2,"message":"b","content":"b","sender":{"userID":2},"receiver":{"userID":1}}]"#,
    );
    let client = ApiClient::new(&base_url).unwrap();

    let messages = client.list_chats("t").unwrap();
    server.join().unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "b");
}

fn registration() -> RegistrationForm {
    RegistrationForm {
        username: " ada ".to_string(),
        firstname: "Ada".to_string(),
        lastname: "Lovelace".to_string(),
        bio: "engines".to_string(),
        password: "secret".to_string(),
        confirm_password: "secret".to_string(),
    }
}

#[test]
fn test_register_posts_validated_form() {
    let (base_url, server) = serve_once("201 Created", &[], "");
    let client = ApiClient::new(&base_url).unwrap();

    let request = registration().validate().unwrap();
    client.register(&request).unwrap();
    let raw = server.join().unwrap();

    assert!(raw.starts_with("POST /register HTTP/1.1"));
    assert!(raw.contains(r#""username":"ada""#));
    assert!(raw.contains(r#""lastname":"Lovelace""#));
    assert!(raw.contains(r#""password":"secret""#));
    assert!(!raw.contains("confirm"));
}

#[test]
fn test_register_conflict_is_http_error() {
    let (base_url, server) = serve_once("409 Conflict", &[], "Username already taken");
    let client = ApiClient::new(&base_url).unwrap();

    let request = registration().validate().unwrap();
    let err = client.register(&request).unwrap_err();
    server.join().unwrap();

    assert_eq!(
        err,
        ClientError::Http {
            status: 409,
            message: "Username already taken".to_string()
        }
    );
}
