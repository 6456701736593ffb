//! End-to-end scenarios exercising the jar's set/get state machine through
//! literal `Set-Cookie` strings, with no network involved.

use cookiejar::{CookieRequestOptions, Jar};
use url::Url;

fn init_logging() {
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

fn url(s: &str) -> Url {
    init_logging();
    Url::parse(s).unwrap()
}

#[test]
fn simple_cookie_round_trips() {
    let jar = Jar::new();
    jar.set("a=1", &url("http://example.com/"), Default::default())
        .unwrap();

    assert_eq!(
        jar.get_cookie_string(&url("http://example.com/"), Default::default())
            .unwrap()
            .as_deref(),
        Some("a=1")
    );
}

#[test]
fn longer_path_is_emitted_first() {
    let jar = Jar::new();
    let origin = url("http://example.com/");

    jar.set("a=1; Path=/x", &origin, Default::default()).unwrap();
    jar.set("a=2; Path=/", &origin, Default::default()).unwrap();

    assert_eq!(
        jar.get_cookie_string(&url("http://example.com/x/y"), Default::default())
            .unwrap()
            .as_deref(),
        Some("a=1; a=2")
    );
}

#[test]
fn secure_cookie_is_withheld_over_plain_http() {
    let jar = Jar::new();
    jar.set("s=1; Secure", &url("https://example.com/"), Default::default())
        .unwrap();

    assert_eq!(
        jar.get_cookie_string(&url("http://example.com/"), Default::default())
            .unwrap(),
        None
    );
}

#[test]
fn http_only_cookie_is_withheld_from_a_script_context() {
    let jar = Jar::new();
    jar.set("h=1; HttpOnly", &url("http://example.com/"), Default::default())
        .unwrap();

    let options = CookieRequestOptions {
        http: false,
        ..Default::default()
    };

    assert_eq!(
        jar.get_cookie_string(&url("http://example.com/"), options).unwrap(),
        None
    );
}

#[test]
fn domain_attribute_permits_lookup_from_the_parent() {
    let jar = Jar::new();
    jar.set(
        "a=1; Domain=example.com",
        &url("http://sub.example.com/"),
        Default::default(),
    )
    .unwrap();

    assert_eq!(
        jar.get_cookie_string(&url("http://example.com/"), Default::default())
            .unwrap()
            .as_deref(),
        Some("a=1")
    );
}

#[test]
fn past_expiry_evicts_the_cookie() {
    let jar = Jar::new();
    jar.set(
        "a=1; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        &url("http://example.com/"),
        Default::default(),
    )
    .unwrap();

    assert_eq!(
        jar.get_cookie_string(&url("http://example.com/"), Default::default())
            .unwrap(),
        None
    );

    let blob = jar.serialize().unwrap();
    assert!(blob["cookies"].as_array().unwrap().is_empty());
}

#[test]
fn multiple_cookies_from_the_same_response_are_independent() {
    let jar = Jar::new();
    let origin = url("http://example.com/");

    jar.set("foo=bar", &origin, Default::default()).unwrap();
    jar.set("baz=123", &origin, Default::default()).unwrap();

    let cookies = jar.get(&origin, Default::default()).unwrap();
    let mut names: Vec<&str> = cookies.iter().map(cookiejar::Cookie::name).collect();
    names.sort_unstable();

    assert_eq!(names, ["baz", "foo"]);
}

#[test]
fn jar_round_trips_through_serialize_and_deserialize() {
    let jar = Jar::new();
    jar.set(
        "a=1; Path=/x; Domain=example.com",
        &url("http://example.com/"),
        Default::default(),
    )
    .unwrap();
    jar.set("b=2", &url("http://other.example/"), Default::default())
        .unwrap();

    let blob = jar.serialize().unwrap();
    let restored = Jar::deserialize(&blob).unwrap();

    assert_eq!(
        restored
            .get_cookie_string(&url("http://example.com/x"), Default::default())
            .unwrap()
            .as_deref(),
        Some("a=1")
    );
    assert_eq!(
        restored
            .get_cookie_string(&url("http://other.example/"), Default::default())
            .unwrap()
            .as_deref(),
        Some("b=2")
    );
}
