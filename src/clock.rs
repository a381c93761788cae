use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Asia::Seoul;
use chrono_tz::Tz;

/// 현재 한국 시각을 반환한다
pub fn now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Seoul)
}

/// 주어진 시각이 속한 날의 자정 (현지 기준)
pub fn local_midnight(at: DateTime<Tz>) -> DateTime<Tz> {
    // 한국 표준시는 서머타임이 없으므로 자정은 항상 하나로 정해진다
    Seoul
        .from_local_datetime(&at.date_naive().and_hms_opt(0, 0, 0).unwrap())
        .single()
        .unwrap()
}

/// 다음 자정 (현지 기준) - 매일 리포트의 기준 시각
pub fn next_midnight(at: DateTime<Tz>) -> DateTime<Tz> {
    local_midnight(at) + Duration::days(1)
}

/// 날짜를 "2024년 04월 01일" 형식으로 포맷한다
pub fn format_date(at: DateTime<Tz>) -> String {
    at.format("%Y년 %m월 %d일").to_string()
}

/// 시각을 "2024년 04월 01일 오후 03시 05분 09초" 형식으로 포맷한다
pub fn format_timestamp(at: DateTime<Tz>) -> String {
    let (is_pm, hour) = at.hour12();
    let meridiem = if is_pm { "오후" } else { "오전" };
    format!(
        "{} {} {:02}시 {:02}분 {:02}초",
        format_date(at),
        meridiem,
        hour,
        at.minute(),
        at.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Tz> {
        Seoul.with_ymd_and_hms(2024, 4, 1, h, m, s).unwrap()
    }

    #[test]
    fn local_midnight_truncates_to_start_of_day() {
        assert_eq!(local_midnight(at(13, 45, 30)), at(0, 0, 0));
        assert_eq!(local_midnight(at(0, 0, 0)), at(0, 0, 0));
    }

    #[test]
    fn next_midnight_is_the_following_day() {
        let tomorrow = Seoul.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        assert_eq!(next_midnight(at(13, 45, 30)), tomorrow);
        assert_eq!(next_midnight(at(23, 59, 59)), tomorrow);
        // 자정 정각에 깨어났다면 다음 자정까지 기다린다
        assert_eq!(next_midnight(at(0, 0, 0)), tomorrow);
    }

    #[test]
    fn timestamp_uses_korean_twelve_hour_clock() {
        assert_eq!(
            format_timestamp(at(15, 5, 9)),
            "2024년 04월 01일 오후 03시 05분 09초"
        );
        assert_eq!(
            format_timestamp(at(0, 0, 0)),
            "2024년 04월 01일 오전 12시 00분 00초"
        );
    }
}
