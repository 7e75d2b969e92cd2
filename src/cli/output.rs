use colored::Colorize;

use crate::client::ApiResponse;
use crate::error::DaisyconError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Json,
}

/// Render a response body, plus the captured `X-` headers when asked.
pub fn format_response(resp: &ApiResponse, mode: OutputMode, show_headers: bool) -> String {
    match mode {
        OutputMode::Json => {
            let json = serde_json::json!({
                "status": resp.status,
                "headers": resp.headers,
                "body": resp.body,
            });
            serde_json::to_string_pretty(&json).unwrap_or_default()
        }
        OutputMode::Pretty => {
            let mut out = String::new();
            if show_headers {
                for (name, value) in &resp.headers {
                    out.push_str(&format!("{name}: {value}\n"));
                }
                if !resp.headers.is_empty() {
                    out.push('\n');
                }
            }
            match &resp.body {
                Some(body) => out.push_str(&serde_json::to_string_pretty(body).unwrap_or_default()),
                None => out.push_str(&format!("(empty response, status {})", resp.status)),
            }
            out
        }
    }
}

pub fn print_response(resp: &ApiResponse, mode: OutputMode, show_headers: bool) {
    println!("{}", format_response(resp, mode, show_headers));
}

pub fn print_error(err: &DaisyconError, json_mode: bool, is_tty: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&err.to_json()).unwrap_or_default());
    } else if is_tty {
        eprintln!("{}: {}", "Error".red().bold(), err);
    } else {
        eprintln!("Error: {err}");
    }
}
