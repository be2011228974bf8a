// Copyright (C) 2026 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Shared tracing initialization for tickworld binaries

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Storage engine internals are chatty at debug level; keep them at warn unless asked.
const QUIET_DIRECTIVES: &[&str] = &["fjall=warn", "lsm_tree=warn"];

fn build_filter(debug_fallback: bool) -> Result<EnvFilter, eyre::Report> {
    let mut filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => {
            let level = if debug_fallback { "debug" } else { "info" };
            EnvFilter::new(level)
        }
    };
    for directive in QUIET_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

/// Initialize tracing with environment-based configuration and fallback support
///
/// - Uses `RUST_LOG` environment variable when available
/// - Falls back to DEBUG when `debug_fallback` is set and `RUST_LOG` is not, INFO otherwise
pub fn init_tracing(debug_fallback: bool) -> Result<(), eyre::Report> {
    let filter = build_filter(debug_fallback)?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_ansi(true)
                .with_file(true)
                .with_target(false)
                .with_line_number(true)
                .with_thread_names(true)
                .with_span_events(fmt::format::FmtSpan::NONE),
        )
        .with(filter)
        .try_init()
        .map_err(|e| eyre::eyre!("Unable to install tracing subscriber: {e}"))?;

    Ok(())
}
