//! Startup banner and session summary display.

use crate::consts::format_number;
use crate::generator::TokenUsage;

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub model: &'a str,
    pub auth_status: &'a str,
    pub secrets: &'a str,
}

/// Print the startup banner with session info and the welcome line.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║             P Y T H I A               ║
   ║            ask me anything            ║
   ╚═══════════════════════════════════════╝

   version  {}
   model    {}
   auth     {}
   secrets  {}

   Welcome! Type a prompt and press Enter.
"#,
        env!("CARGO_PKG_VERSION"),
        info.model,
        info.auth_status,
        info.secrets,
    );
}

/// Print the session summary (token usage + farewell).
pub fn print_session_summary(usage: TokenUsage) {
    if usage.total() > 0 {
        println!(
            "session: {} prompt + {} output = {} tokens",
            format_number(usage.prompt_tokens),
            format_number(usage.output_tokens),
            format_number(usage.total()),
        );
    }
    println!("goodbye.");
}
