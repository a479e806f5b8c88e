//! demos/name_backend.rs
//! Stand-in for the upstream name-generator service, for manual end-to-end
//! runs of the proxy.
//! Run: cargo run --example name_backend -- <port>

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, StatusCode,
};
use rand::Rng;
use std::{convert::Infallible, net::SocketAddr};

const VOWELS: &[char] = &['a', 'e', 'y', 'u', 'o', 'a', 'i', 'o'];
const CONSONANTS: &[char] = &[
    'w', 'r', 't', 'p', 's', 'd', 'f', 'g', 'h', 'm', 'v', 'k', 'n',
];

fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let len = rng.gen_range(2..=7);
    let mut vowel_turn = rng.gen_bool(0.5);

    let mut name = String::with_capacity(len + 1);
    for _ in 0..len {
        let pool = if vowel_turn { VOWELS } else { CONSONANTS };
        name.push(pool[rng.gen_range(0..pool.len())]);
        if rng.gen_range(0..=10) > 4 {
            vowel_turn = !vowel_turn;
        }
    }

    let mut chars = name.chars();
    let first = chars.next().unwrap_or('a').to_ascii_uppercase();
    format!("{}{}", first, chars.as_str())
}

async fn handle(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let response = match req.uri().path() {
        "/" => Response::new(Body::from("Hello from service API")),
        "/name" => {
            let body = serde_json::json!({ "name": random_name() });
            Response::builder()
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        }
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Not Found"))
            .unwrap(),
    };
    Ok(response)
}

#[tokio::main]
async fn main() {
    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    let make_service =
        make_service_fn(|_| async { Ok::<_, Infallible>(service_fn(handle)) });

    println!("name backend listening on http://{}", addr);
    if let Err(e) = hyper::Server::bind(&addr).serve(make_service).await {
        eprintln!("server error: {}", e);
    }
}
