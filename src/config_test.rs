use super::*;

const VARS: [&str; 6] = [
    "HOST",
    "PORT",
    "CLIENT_QUEUE_CAPACITY",
    "HUB_QUEUE_CAPACITY",
    "WS_PING_INTERVAL_SECS",
    "WS_MAX_MESSAGE_BYTES",
];

/// # Safety
/// Env mutation is process-global; every test touching it holds `ENV_LOCK`.
unsafe fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[test]
fn from_env_uses_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_env() };

    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.addr().to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.ping_interval, Some(Duration::from_secs(DEFAULT_PING_INTERVAL_SECS)));
    assert_eq!(cfg.max_message_bytes, DEFAULT_MAX_MESSAGE_BYTES);
}

#[test]
fn from_env_reads_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("HOST", "127.0.0.1");
        std::env::set_var("PORT", "8080");
        std::env::set_var("CLIENT_QUEUE_CAPACITY", "4");
        std::env::set_var("HUB_QUEUE_CAPACITY", "16");
        std::env::set_var("WS_PING_INTERVAL_SECS", "5");
        std::env::set_var("WS_MAX_MESSAGE_BYTES", "2048");
    }

    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg.addr().to_string(), "127.0.0.1:8080");
    assert_eq!(cfg.client_queue_capacity, 4);
    assert_eq!(cfg.hub_queue_capacity, 16);
    assert_eq!(cfg.ping_interval, Some(Duration::from_secs(5)));
    assert_eq!(cfg.max_message_bytes, 2048);

    unsafe { clear_env() };
}

#[test]
fn zero_ping_interval_disables_heartbeat() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("WS_PING_INTERVAL_SECS", "0");
    }

    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg.ping_interval, None);

    unsafe { clear_env() };
}

#[test]
fn invalid_port_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
    }

    let err = Config::from_env().unwrap_err();
    assert_eq!(err, ConfigError::Invalid { var: "PORT", value: "not-a-port".into() });

    unsafe { clear_env() };
}

#[test]
fn zero_queue_capacity_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("CLIENT_QUEUE_CAPACITY", "0");
    }

    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "CLIENT_QUEUE_CAPACITY", .. }));

    unsafe { clear_env() };
}
