use crate::args::{parse_call_args, parse_pairs};
use crate::client::Client;
use crate::error::DaisyconError;
use crate::request::{Method, Request};
use crate::resolver::resolve;

use super::output::{print_response, OutputMode};

fn output_mode(json: bool) -> OutputMode {
    if json {
        OutputMode::Json
    } else {
        OutputMode::Pretty
    }
}

/// `daisycon call getPublishersMedia 5 x=1`
pub async fn run_call(
    cli_config: Option<&str>,
    name: &str,
    args: &[String],
    json: bool,
    show_headers: bool,
) -> Result<(), DaisyconError> {
    let positional = parse_call_args(args)?;
    let request = resolve(name, &positional)?;
    send(cli_config, &request, json, show_headers).await
}

/// `daisycon request GET /categories page=2`
pub async fn run_request(
    cli_config: Option<&str>,
    method: &str,
    path: &str,
    pairs: &[String],
    json: bool,
    show_headers: bool,
) -> Result<(), DaisyconError> {
    let method = Method::from_keyword(method).ok_or_else(|| DaisyconError::UnknownMethod {
        name: method.to_string(),
        suggestion: None,
    })?;
    let request = Request {
        method,
        path: path.to_string(),
        payload: parse_pairs(pairs)?,
    };
    send(cli_config, &request, json, show_headers).await
}

async fn send(
    cli_config: Option<&str>,
    request: &Request,
    json: bool,
    show_headers: bool,
) -> Result<(), DaisyconError> {
    let client = Client::from_config(cli_config)?;
    let resp = client.execute(request, false).await?;
    print_response(&resp, output_mode(json), show_headers);
    Ok(())
}
