//! Print the admin API's OpenAPI document as JSON.

use std::io::{self, Write};

use broker_admin::ApiDoc;
use utoipa::OpenApi;

fn main() -> io::Result<()> {
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(|error| io::Error::other(format!("encode OpenAPI document: {error}")))?;
    writeln!(io::stdout().lock(), "{document}")
}
