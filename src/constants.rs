pub const JIKAN_API: &str = "https://api.jikan.moe/v4";

pub mod cache {

    pub const CATALOG_TTL_HOURS: u64 = 4;

    pub const DETAIL_TTL_HOURS: u64 = 4;

    /// Longest TTL accepted from config (one year).
    pub const MAX_TTL_HOURS: u64 = 24 * 365;

    pub const MEMORY_MAX_ENTRIES: usize = 10_000;
}

pub mod normalize {

    pub const SYNOPSIS_PREVIEW_CHARS: usize = 200;

    pub const CAROUSEL_GENRES: usize = 3;
}

pub mod limits {

    /// Upstream rejects page sizes above this.
    pub const MAX_PAGE_SIZE: u32 = 25;

    pub const SCHEDULE_PAGE_SIZE: u32 = 25;

    pub const CAROUSEL_SIZE: u32 = 12;

    pub const RECENT_PROFILE_COMMENTS: u64 = 5;

    pub const RECENT_PROFILE_FAVORITES: u64 = 10;
}

pub mod comments {

    pub const MIN_TEXT_CHARS: usize = 5;

    pub const MAX_TEXT_CHARS: usize = 2000;

    pub const MIN_RATING: i32 = 1;

    pub const MAX_RATING: i32 = 10;
}

pub mod profiles {

    pub const MAX_BIO_CHARS: usize = 500;

    pub const AVATAR_CHOICES: &[&str] = &[
        "avatar_1.jpg",
        "avatar_2.jpg",
        "avatar_3.jpg",
        "avatar_4.jpg",
        "avatar_5.jpg",
        "avatar_6.jpg",
        "avatar_7.jpg",
    ];

    pub const DEFAULT_AVATAR: &str = "avatar_1.jpg";
}
