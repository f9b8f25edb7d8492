diesel::table! {
    movies (id) {
        id -> Int4,
        title -> Varchar,
        description -> Text,
        date_added -> Timestamp,
        video_file -> Nullable<Varchar>,
    }
}
