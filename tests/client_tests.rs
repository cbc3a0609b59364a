use anyhow::Result;
use notification_service::clients::{
    mailer::{MailTransport, MailerClient},
    users::{UserDirectory, UserServiceClient},
};
use uuid::Uuid;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path, query_param},
};

/// Test: the mailer posts the rendered content and treats 2xx as success
#[tokio::test]
async fn test_mailer_sends_rendered_content() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_json(serde_json::json!({
            "to": "a@x.com",
            "subject": "Welcome A",
            "body": "Code: 123456"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mailer = MailerClient::with_base_url(server.uri())?;
    mailer.send("a@x.com", "Welcome A", "Code: 123456").await?;

    Ok(())
}

/// Test: a non-2xx mail transport response surfaces as an error
#[tokio::test]
async fn test_mailer_propagates_failure() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(502).set_body_string("relay down"))
        .mount(&server)
        .await;

    let mailer = MailerClient::with_base_url(server.uri())?;
    let result = mailer.send("a@x.com", "s", "b").await;

    assert!(result.is_err());

    Ok(())
}

/// Test: a known user is returned with its id
#[tokio::test]
async fn test_user_lookup_found() -> Result<()> {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/users/by-email"))
        .and(query_param("email", "a@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userId": user_id,
            "email": "a@x.com",
            "fullName": "Ada Lovelace"
        })))
        .mount(&server)
        .await;

    let client = UserServiceClient::with_base_url(server.uri())?;
    let user = client.find_by_email("a@x.com").await?;

    let user = user.expect("user should be found");
    assert_eq!(user.user_id, user_id);
    assert_eq!(user.full_name, "Ada Lovelace");

    Ok(())
}

/// Test: a 404 from the user service is a tolerated miss, not an error
#[tokio::test]
async fn test_user_lookup_not_found_is_none() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/by-email"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = UserServiceClient::with_base_url(server.uri())?;
    let user = client.find_by_email("nobody@x.com").await?;

    assert!(user.is_none());

    Ok(())
}

/// Test: a 5xx from the user service is an error the pipeline can absorb
#[tokio::test]
async fn test_user_lookup_server_error() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/by-email"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = UserServiceClient::with_base_url(server.uri())?;
    let result = client.find_by_email("a@x.com").await;

    assert!(result.is_err());

    Ok(())
}
