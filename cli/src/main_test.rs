use super::*;

#[test]
fn request_args_parse_repeated_headers() {
    let cli = Cli::try_parse_from([
        "wsr",
        "request",
        "--url",
        "wss://chat.example.org/v1/websocket",
        "--verb",
        "PUT",
        "--path",
        "/v1/messages",
        "--header",
        "content-type:application/json",
        "--header",
        "x-trace:1",
        "--body",
        "{}",
        "--timeout-ms",
        "1500",
    ])
    .expect("parse");

    assert_eq!(cli.url.as_deref(), Some("wss://chat.example.org/v1/websocket"));
    let Command::Request(args) = cli.command else {
        panic!("expected request subcommand");
    };
    let request = build_request(args);
    assert_eq!(request.verb, "PUT");
    assert_eq!(request.path, "/v1/messages");
    assert_eq!(request.headers, vec!["content-type:application/json".to_owned(), "x-trace:1".to_owned()]);
    assert_eq!(request.body.as_deref(), Some(&b"{}"[..]));
    assert_eq!(request.timeout, Some(Duration::from_millis(1500)));
}

#[test]
fn verb_defaults_to_get() {
    let cli = Cli::try_parse_from(["wsr", "--url", "ws://localhost", "request", "--path", "/"]).expect("parse");
    let Command::Request(args) = cli.command else {
        panic!("expected request subcommand");
    };
    assert_eq!(args.verb, "GET");
}

#[test]
fn response_json_renders_body_as_text() {
    let response = Response {
        status: 200,
        message: "OK".to_owned(),
        headers: vec!["x-a:1".to_owned()],
        body: Some(b"hello".to_vec()),
    };

    let value = response_json(&response).expect("json");
    assert_eq!(value["status"], 200);
    assert_eq!(value["message"], "OK");
    assert_eq!(value["headers"][0], "x-a:1");
    assert_eq!(value["body"], "hello");
}

#[test]
fn response_json_keeps_missing_body_null() {
    let response = Response { status: -1, message: "Connection closed".to_owned(), headers: Vec::new(), body: None };

    let value = response_json(&response).expect("json");
    assert_eq!(value["status"], -1);
    assert!(value["body"].is_null());
}
