use anyhow::Result;
use axum::body::Body;
use axum::Router;
use chrono::DateTime;
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use geosnap::config::{Feed, Tracing};
use geosnap::{Config, Database};

fn test_config() -> Config {
    Config {
        tracing: Tracing {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn app() -> Router {
    geosnap::axum::app(test_config(), Database::temporary().unwrap())
}

fn app_with(config: Config) -> Router {
    geosnap::axum::app(config, Database::temporary().unwrap())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    Ok((status, value))
}

async fn signup(app: &Router, user: &str, password: &str) -> Result<StatusCode> {
    let (status, _) = send(
        app,
        Method::POST,
        "/galleryitems/signup",
        None,
        Some(json!({ "userName": user, "password": password })),
    )
    .await?;
    Ok(status)
}

async fn login(app: &Router, user: &str, password: &str) -> Result<String> {
    let (status, body) = send(
        app,
        Method::POST,
        "/galleryitems/login",
        None,
        Some(json!({ "userName": user, "password": password })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(body["token"].as_str().expect("token in response").to_string())
}

async fn add_item(app: &Router, token: &str, user: &str, name: &str, coords: [f64; 2]) -> Result<Value> {
    let (status, body) = send(
        app,
        Method::POST,
        "/galleryitems/add",
        Some(token),
        Some(json!({
            "userName": user,
            "name": name,
            "url": format!("http://x/{name}"),
            "coordinatesHolder": { "coordinates": coords },
            "isPosted": false,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "add_item failed: {body}");
    Ok(body)
}

async fn publish(app: &Router, token: &str, user: &str, item: &Value) -> Result<(StatusCode, Value)> {
    send(
        app,
        Method::POST,
        "/post/add",
        Some(token),
        Some(json!({
            "username": user,
            "itemId": item["id"],
            "name": item["name"],
            "url": item["url"],
            "coordinatesHolder": item["coordinatesHolder"],
        })),
    )
    .await
}

#[tokio::test]
async fn root_answers_liveness_text() -> Result<()> {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Gallery API is running.".to_string()));
    Ok(())
}

#[tokio::test]
async fn signup_login_validate_flow() -> Result<()> {
    let app = app();

    assert_eq!(signup(&app, "alice", "pw1").await?, StatusCode::OK);

    // duplicate signup conflicts and leaves the record usable
    assert_eq!(signup(&app, "alice", "other").await?, StatusCode::CONFLICT);

    // missing fields are a validation error
    assert_eq!(signup(&app, "", "pw").await?, StatusCode::BAD_REQUEST);
    assert_eq!(signup(&app, "bob", "").await?, StatusCode::BAD_REQUEST);

    // wrong password and unknown user both read as invalid credentials
    let (status, _) = send(
        &app,
        Method::POST,
        "/galleryitems/login",
        None,
        Some(json!({ "userName": "alice", "password": "wrong" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(
        &app,
        Method::POST,
        "/galleryitems/login",
        None,
        Some(json!({ "userName": "nobody", "password": "pw" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "alice", "pw1").await?;

    let (status, _) = send(&app, Method::GET, "/auth/validate", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    // missing and malformed tokens are rejected
    let (status, _) = send(&app, Method::GET, "/auth/validate", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/auth/validate", Some("garbage"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn gallery_and_feed_end_to_end() -> Result<()> {
    let app = app();

    signup(&app, "alice", "pw1").await?;
    let token = login(&app, "alice", "pw1").await?;

    let item = add_item(&app, &token, "alice", "img1", [10.0, 20.0]).await?;
    assert_eq!(item["isPosted"], json!(false));

    let (status, items) = send(&app, Method::GET, "/galleryitems/alice", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["name"], "img1");
    assert_eq!(items[0]["isPosted"], json!(false));

    let (status, post) = publish(&app, &token, "alice", &item).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["username"], "alice");

    // the flag flipped together with the post insert
    let (_, items) = send(&app, Method::GET, "/galleryitems/alice", None, None).await?;
    assert_eq!(items[0]["isPosted"], json!(true));

    let (status, posts) = send(&app, Method::GET, "/post/all", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posts.as_array().unwrap().len(), 1);
    assert_eq!(posts[0]["name"], "img1");

    // republish is a conflict, feed still holds one post
    let (status, _) = publish(&app, &token, "alice", &item).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // unpublish removes the post and clears the flag
    let uri = format!("/posts/delete/alice/{}", item["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, posts) = send(&app, Method::GET, "/post/all", None, None).await?;
    assert!(posts.as_array().unwrap().is_empty());
    let (_, items) = send(&app, Method::GET, "/galleryitems/alice", None, None).await?;
    assert_eq!(items[0]["isPosted"], json!(false));

    // second unpublish finds nothing
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn mutating_calls_require_matching_identity() -> Result<()> {
    let app = app();

    signup(&app, "alice", "pw1").await?;
    signup(&app, "bob", "pw2").await?;
    let alice = login(&app, "alice", "pw1").await?;

    // no token at all
    let (status, _) = send(
        &app,
        Method::POST,
        "/galleryitems/add",
        None,
        Some(json!({ "userName": "alice", "name": "x", "url": "http://x" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // alice's token cannot touch bob's gallery
    let (status, _) = send(
        &app,
        Method::POST,
        "/galleryitems/add",
        Some(&alice),
        Some(json!({ "userName": "bob", "name": "x", "url": "http://x" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let item = add_item(&app, &alice, "alice", "img", [0.0, 0.0]).await?;
    let uri = format!("/galleryitems/delete/bob/{}", item["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn delete_item_by_id() -> Result<()> {
    let app = app();
    signup(&app, "alice", "pw1").await?;
    let token = login(&app, "alice", "pw1").await?;

    let first = add_item(&app, &token, "alice", "img", [0.0, 0.0]).await?;
    // duplicate display name, distinct id
    let second = add_item(&app, &token, "alice", "img", [0.0, 0.0]).await?;

    let uri = format!("/galleryitems/delete/alice/{}", first["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, items) = send(&app, Method::GET, "/galleryitems/alice", None, None).await?;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["id"], second["id"]);

    // deleting the same id again is a 404
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn listing_unknown_user_is_not_found() -> Result<()> {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/galleryitems/ghost", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // the global listing is just empty
    let (status, items) = send(&app, Method::GET, "/galleryitems", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(items.as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn recents_paginate_with_prev_time_cursor() -> Result<()> {
    let app = app();
    signup(&app, "alice", "pw1").await?;
    let token = login(&app, "alice", "pw1").await?;

    for i in 0..4 {
        let item = add_item(&app, &token, "alice", &format!("img{i}"), [0.0, 0.0]).await?;
        let (status, _) = publish(&app, &token, "alice", &item).await?;
        assert_eq!(status, StatusCode::OK);
        // keep creation timestamps apart at millisecond resolution, the
        // cursor is epoch millis
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (status, first) = send(&app, Method::GET, "/posts/recents?limit=2", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let first = first.as_array().unwrap().clone();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0]["name"], "img3");
    assert_eq!(first[1]["name"], "img2");

    let cursor = DateTime::parse_from_rfc3339(first[1]["createdAt"].as_str().unwrap())?
        .timestamp_millis();
    let uri = format!("/posts/recents?limit=2&prevTime={cursor}");
    let (status, second) = send(&app, Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let second = second.as_array().unwrap().clone();
    assert_eq!(second.len(), 2);
    assert_eq!(second[0]["name"], "img1");
    assert_eq!(second[1]["name"], "img0");

    // garbage cursor is a validation error
    let (status, _) = send(
        &app,
        Method::GET,
        "/posts/recents?limit=2&prevTime=yesterday",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn nearby_respects_distance_bound() -> Result<()> {
    let mut config = test_config();
    config.feed = Feed {
        default_limit: 20,
        max_distance_m: 200_000.0,
    };
    let app = app_with(config);

    signup(&app, "alice", "pw1").await?;
    let token = login(&app, "alice", "pw1").await?;

    for (name, coords) in [
        ("close", [0.0, 0.0]),
        ("mid", [1.0, 0.0]),
        ("far", [10.0, 0.0]),
    ] {
        let item = add_item(&app, &token, "alice", name, coords).await?;
        let (status, _) = publish(&app, &token, "alice", &item).await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, posts) = send(&app, Method::GET, "/posts/nearby?lat=0&lng=0", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let posts = posts.as_array().unwrap().clone();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["name"], "close");
    assert_eq!(posts[1]["name"], "mid");

    let (status, posts) = send(
        &app,
        Method::GET,
        "/posts/nearby?lat=0&lng=0&limit=1",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posts.as_array().unwrap().len(), 1);

    // missing or unparseable coordinates are a validation error
    let (status, _) = send(&app, Method::GET, "/posts/nearby?lat=0", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        Method::GET,
        "/posts/nearby?lat=abc&lng=0",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn store_persists_across_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("db");

    {
        let db = Database::new(&path)?;
        geosnap::gallery::create(&db, "alice", "pw1")?;
        db.flush()?;
    }

    let db = Database::new(&path)?;
    let gallery = geosnap::gallery::find_by_username(&db, "alice")?;
    assert_eq!(gallery.user_name, "alice");
    Ok(())
}
