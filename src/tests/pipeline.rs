#[cfg(test)]
mod gather {
    use chrono::NaiveDate;
    use scraper::Html;
    use url::Url;

    use crate::{
        listing::{self, MonthKey, Role, ShowEntry},
        months::Months,
        pipeline::{gather, Settings},
        tests::fake::{artist, track, Fake},
    };

    fn settings(min_artists: usize, n_tracks: usize) -> Settings {
        Settings {
            min_artists,
            n_tracks,
            market: String::from("US"),
        }
    }

    fn month(month: u32) -> MonthKey {
        MonthKey::new(2024, month).unwrap()
    }

    fn entry(month: MonthKey, artist: &str) -> ShowEntry {
        ShowEntry {
            month,
            artist: artist.into(),
            role: Role::Headliner,
        }
    }

    fn ids(buckets: &crate::tracks::Buckets, month: MonthKey) -> Vec<String> {
        buckets
            .get(&month)
            .unwrap_or_default()
            .iter()
            .map(|x| x.id.clone())
            .collect()
    }

    #[tokio::test]
    async fn tracks_follow_artist_order() {
        let fake = Fake::default()
            .with_artist("Band A", vec![artist("a", 50)])
            .with_artist("Band B", vec![artist("b", 50)])
            .with_tracks("a", vec![track("a1", 10), track("a2", 90), track("a3", 50)])
            .with_tracks("b", vec![track("b1", 70)]);

        let months = Months::aggregate(
            vec![entry(month(3), "Band B"), entry(month(3), "Band A")],
            1,
        );

        let buckets = gather(&fake, months, &settings(1, 2)).await;
        assert_eq!(ids(&buckets, month(3)), vec!["b1", "a2", "a3"]);
    }

    #[tokio::test]
    async fn unknown_artist_adds_nothing() {
        let fake = Fake::default()
            .with_artist("Band A", vec![artist("a", 50)])
            .with_tracks("a", vec![track("a1", 10)]);

        let months = Months::aggregate(
            vec![
                entry(month(3), "Unknown Obscure Band"),
                entry(month(3), "Band A"),
                entry(month(4), "Unknown Obscure Band"),
            ],
            1,
        );

        let buckets = gather(&fake, months, &settings(1, 3)).await;
        assert_eq!(ids(&buckets, month(3)), vec!["a1"]);
        assert!(buckets.get(&month(4)).is_none());
        assert_eq!(buckets.len(), 1);
    }

    #[tokio::test]
    async fn artists_are_searched_once() {
        let fake = Fake::default()
            .with_artist("Band A", vec![artist("a", 50)])
            .with_tracks("a", vec![track("a1", 10)]);

        let months = Months::aggregate(
            vec![entry(month(3), "Band A"), entry(month(4), "Band A")],
            1,
        );

        let buckets = gather(&fake, months, &settings(1, 3)).await;
        assert_eq!(fake.searches(), vec!["Band A"]);
        assert_eq!(ids(&buckets, month(3)), vec!["a1"]);
        assert_eq!(ids(&buckets, month(4)), vec!["a1"]);
    }

    #[tokio::test]
    async fn failing_lookups_are_skipped() {
        let fake = Fake::default()
            .with_artist("Band A", vec![artist("a", 50)])
            .with_artist("Band C", vec![artist("c", 50)])
            .with_tracks("c", vec![track("c1", 10)])
            .failing("Band B")
            .failing("a");

        let months = Months::aggregate(
            vec![
                entry(month(3), "Band A"),
                entry(month(3), "Band B"),
                entry(month(3), "Band C"),
            ],
            1,
        );

        let buckets = gather(&fake, months, &settings(1, 3)).await;
        assert_eq!(ids(&buckets, month(3)), vec!["c1"]);
    }

    #[tokio::test]
    async fn from_listing_to_tracks() {
        let mut items = String::new();
        for i in 0..12 {
            items.push_str(&format!(
                "<div class=\"list-view-item\"><a href=\"/e/{i}\">show</a>
                    <div class=\"list-view-details\">
                        <h2 class=\"dates\">Fri 3.{}</h2>
                        <h1 class=\"headliners\">Band {i}</h1>
                    </div>
                </div>",
                i + 1
            ));
        }

        let html = Html::parse_document(&format!("<div>{items}</div>"));
        let base = Url::parse("http://www.theindependentsf.com/").unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let shows = listing::parse(&html, &base, today);

        let mut fake = Fake::default();
        for i in 0..12 {
            fake = fake
                .with_artist(&format!("Band {i}"), vec![artist(&format!("id{i}"), 1)])
                .with_tracks(&format!("id{i}"), vec![track(&format!("t{i}"), 1)]);
        }

        let dropped = Months::aggregate(listing::entries(&shows), 13);
        assert!(gather(&fake, dropped, &settings(13, 3)).await.is_empty());

        let kept = Months::aggregate(listing::entries(&shows), 10);
        let buckets = gather(&fake, kept, &settings(10, 3)).await;
        let (month, tracks) = buckets.iter().next().unwrap();

        assert_eq!(month.to_string(), "March.2024");
        assert_eq!(tracks.len(), 12);
    }
}
