// src/bin/term_code.rs
//
// Decode a CUNYfirst term/session pair: `term_code [TERM] [SESSION]`.

use anyhow::{Context, Result};
use enrollments::resolve;
use std::env;

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let term = args.next().unwrap_or_else(|| "1202".to_string());
    let session = args.next().unwrap_or_else(|| "1".to_string());

    let code = resolve(&term, &session)
        .with_context(|| format!("decoding term {} session {}", term, session))?;
    println!("{} <=> {} ({})", code.code, code.name, code.display);
    Ok(())
}
