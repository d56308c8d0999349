pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# RUNLOG CONFIGURATION
# =============================================================================
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/runlog/config.yml
#   3. /etc/runlog/config.yml
#
# Every setting is optional. Environment variables can be referenced with
# $env{VAR_NAME}.

# =============================================================================
# SERVER
# =============================================================================
server:
  # Base URL of the run event server
  url: http://localhost:3000
  # Timeout for polls, probes and for opening a push session
  timeout: 30s

# =============================================================================
# FEED
# =============================================================================
feed:
  # Pushed events are committed at most once per window
  dispatch_window: 100ms
  # Poll period used when live push is unavailable
  poll_interval: 5s
  # Pause before re-opening a push session that dropped
  reconnect_delay: 1s

# =============================================================================
# TRANSPORT
# =============================================================================
transport:
  # Always poll, never open a push session
  disable_push: false
"#
    .to_string()
}
