/// Constants module to avoid magic strings in the codebase

// Persisted credential keys
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

// Network Configuration
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const LOGIN_PATH: &str = "/login";
pub const PROFILE_PATH: &str = "/profile";
pub const REGISTER_PATH: &str = "/register";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

// Storage
pub const DEFAULT_STORAGE_SCOPE: &str = "session";
pub const APP_NAME: &str = "rapport";
pub const ENV_PREFIX: &str = "RAPPORT_";
