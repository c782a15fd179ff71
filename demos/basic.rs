use std::time::Duration;

use fetch_http::{
    encode_data, with_default_request_opts, with_header, with_json_body, with_retry,
    with_timeout, Context, Fetch,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Post {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("FETCH_BASE_URL")
        .unwrap_or_else(|_| "https://jsonplaceholder.typicode.com".to_owned());

    let api = Fetch::new(
        base_url,
        [
            with_retry(2),
            with_timeout(Duration::from_secs(5)),
            with_default_request_opts([with_header("Accept", "application/json")]),
        ],
    );

    let post: Post = api.get("/posts/1", &[]).await?.decode_json().await?;
    println!("{post:?}");

    let body = encode_data(&Post {
        title: "hello".to_owned(),
        body: "from fetch-http".to_owned(),
        user_id: 1,
    })?;
    let created: serde_json::Value = api
        .post("/posts", body, &[with_json_body()])
        .await?
        .decode_json()
        .await?;
    println!("{created}");

    let (ctx, _cancel) = Context::background().with_timeout(Duration::from_millis(1));
    match api.get_with_context(&ctx, "/posts", &[]).await {
        Ok(response) => println!("unexpectedly fast: {}", response.status()),
        Err(err) => println!("deadline hit: {err}"),
    }

    Ok(())
}
