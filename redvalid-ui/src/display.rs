//! Text rendering for terminal front ends

use crate::models::UploadResult;
use crate::views::query::{QueryResult, QueryState, ResultKind};
use redvalid_common::events::UploadPhase;
use std::fmt::Write;

/// Human-readable byte count (binary units)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Wallet badge: first 8 and last 8 characters
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 16 {
        return address.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn render_phase(phase: Option<UploadPhase>) -> String {
    match phase {
        Some(p) => format!("... {}", p.label()),
        None => "... idle".to_string(),
    }
}

pub fn render_query_state(state: &QueryState) -> String {
    match state {
        QueryState::Idle => "Enter a video URL or select a file to query.".to_string(),
        QueryState::Querying => "Querying...".to_string(),
        QueryState::Failed(message) => format!("Error: {}", message),
        QueryState::Completed(result) => render_query_result(result),
    }
}

pub fn render_query_result(result: &QueryResult) -> String {
    let heading = match result.kind {
        ResultKind::FoundVerified => "VERIFIED: video is registered and verified",
        ResultKind::FoundUnverified => "REGISTERED: video is registered but not verified",
        ResultKind::AlreadyUploadedUnverified => "UPLOADED: video was uploaded but is not verified",
        ResultKind::NotFound => "NOT FOUND: video is not registered",
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", heading);
    let _ = writeln!(out, "{}", result.message);

    if let Some(url) = &result.video_url {
        let _ = writeln!(out, "  Video URL:        {}", url);
    }
    if result.found {
        if let Some(platform) = &result.platform {
            let _ = writeln!(out, "  Platform:         {}", platform);
        }
    }
    if let Some(tx) = &result.tx_hash {
        let _ = writeln!(out, "  Transaction hash: {}", tx);
    }
    if let Some(owner) = &result.owner {
        if let Some(wallet) = &owner.wallet_address {
            let _ = writeln!(out, "  Owner wallet:     {}", wallet);
        }
        if let Some(name) = &owner.full_name {
            let _ = writeln!(out, "  Owner name:       {}", name);
        }
    }
    if let Some(file) = &result.file {
        let _ = writeln!(
            out,
            "  File:             {} ({}, {})",
            file.file_name,
            file.content_type,
            format_bytes(file.size)
        );
    }
    out.trim_end().to_string()
}

pub fn render_upload_result(result: &UploadResult) -> String {
    let mut out = String::new();

    if result.already_registered {
        let _ = writeln!(out, "Video is already registered on chain");
    } else if result.signed {
        let _ = writeln!(out, "Video registered on chain");
    } else {
        let _ = writeln!(out, "Transaction prepared, waiting for signature");
    }

    if let Some(message) = &result.message {
        let _ = writeln!(out, "{}", message);
    }
    if let Some(url) = &result.video_url {
        let _ = writeln!(out, "  Video URL:        {}", url);
    }
    if let Some(name) = &result.file_name {
        let _ = writeln!(out, "  File:             {}", name);
    }
    if let Some(tx) = &result.tx_hash {
        let _ = writeln!(out, "  Transaction hash: {}", tx);
    }
    if !result.signed {
        if let Some(hash) = &result.url_hash {
            let _ = writeln!(out, "  URL hash:         {}", hash);
        }
    }
    if let Some(hash) = &result.data_hash {
        let _ = writeln!(out, "  Data hash:        {}", hash);
    }
    let _ = writeln!(out, "  Wallet:           {}", result.owner_wallet);
    out.trim_end().to_string()
}
