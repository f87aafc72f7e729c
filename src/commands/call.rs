use anyhow::{Context, Result};
use devcal_core::bridge::Bridge;
use devcal_core::protocol::{Request, Response};
use devcal_core::store::LocalStore;
use owo_colors::OwoColorize;

pub fn run(bridge: &Bridge<LocalStore>, method: &str, arguments: Option<&str>) -> Result<()> {
    let arguments = match arguments {
        Some(text) => serde_json::from_str(text)
            .with_context(|| format!("Arguments are not valid JSON: {text}"))?,
        None => serde_json::json!({}),
    };

    let response = bridge.handle(Request::new(method, arguments));
    println!("{}", response.to_line());

    match response {
        Response::Success { .. } => Ok(()),
        Response::Error { code, message } => {
            anyhow::bail!("{} {}", code.as_str().red(), message)
        }
        Response::NotImplemented { method } => {
            anyhow::bail!("{} is not implemented", method.yellow())
        }
    }
}
