pub mod time {

    pub const MILLIS_PER_MINUTE: i64 = 60_000;

    pub const MILLIS_PER_HOUR: i64 = 3_600_000;

    pub const MILLIS_PER_DAY: i64 = 86_400_000;
}

pub mod limits {

    pub const DEFAULT_PAGE_SIZE: u64 = 20;

    pub const MAX_PAGE_SIZE: u64 = 100;

    /// Keeps `page * limit` far from overflowing the paginator's offset.
    pub const MAX_PAGE: u64 = 100_000;

    pub const RELATED_MATCHES: u64 = 6;

    pub const MATCH_SEARCH_RESULTS: u64 = 5;

    pub const FINISHED_MATCHES_SHOWN: usize = 10;

    pub const NOTIFICATION_HISTORY: u64 = 50;

    pub const SEO_DESCRIPTION_CHARS: usize = 155;

    pub const MIN_SEARCH_QUERY_CHARS: usize = 2;
}

pub mod reminders {

    /// Reminders fire for kickoffs between these many minutes from now.
    pub const WINDOW_START_MINUTES: i64 = 15;

    pub const WINDOW_END_MINUTES: i64 = 20;
}

pub mod ppv {

    /// Seconds the placeholder countdown runs when a PPV ad fails to load.
    pub const FALLBACK_COUNTDOWN_SECS: u32 = 15;

    pub const UNLOCK_AD_SLOT: &str = "ppv_preroll";
}

pub mod redemptions {

    /// Letters and digits without the look-alikes `I`, `O`, `0` and `1`.
    pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    pub const CODE_LENGTH: usize = 8;

    pub const MAX_CODE_ATTEMPTS: usize = 10;

    pub const DEFAULT_DURATION_DAYS: i32 = 30;

    pub const DEFAULT_MAX_DEVICES: i32 = 3;

    pub const MAX_CODES_PER_BATCH: u32 = 100;
}

pub mod auth {

    /// Seeded by the admin migration; rotate it with `fanbroj admin regenerate-key`.
    pub const DEFAULT_API_KEY: &str = "fanbroj_default_api_key_please_regenerate";

    pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

    pub const SESSION_KEY: &str = "admin";
}
