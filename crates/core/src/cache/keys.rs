use chrono::NaiveDate;
use uuid::Uuid;

/// Namespace shared by every cache key
pub const CACHE_PREFIX: &str = "weekly-schedule:";

/// Key of the task list for a single calendar day
pub fn day_key(date: NaiveDate) -> String {
    format!("{}tasks:day:{}", CACHE_PREFIX, date.format("%Y-%m-%d"))
}

/// Key of a single task
pub fn task_key(id: Uuid) -> String {
    format!("{}task:{}", CACHE_PREFIX, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_scheme() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(day_key(date), "weekly-schedule:tasks:day:2024-06-10");

        let id = Uuid::nil();
        assert_eq!(
            task_key(id),
            "weekly-schedule:task:00000000-0000-0000-0000-000000000000"
        );
    }
}
