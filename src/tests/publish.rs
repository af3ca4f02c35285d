#[cfg(test)]
mod publish {
    use crate::{
        listing::MonthKey,
        publish::{self, Error},
        tests::fake::Fake,
        tracks::{Buckets, Selected},
    };

    fn month(month: u32) -> MonthKey {
        MonthKey::new(2024, month).unwrap()
    }

    fn buckets(months: Vec<(u32, Vec<&str>)>) -> Buckets {
        let mut buckets = Buckets::default();
        for (m, ids) in months {
            let tracks = ids
                .into_iter()
                .map(|id| Selected {
                    id: id.into(),
                    popularity: 0,
                })
                .collect();

            buckets.extend(month(m), tracks);
        }

        buckets
    }

    #[test]
    fn names_playlists() {
        assert_eq!(
            publish::name("The Independent", month(3)),
            "The Independent March.2024"
        );
    }

    #[tokio::test]
    async fn creates_a_playlist_per_month() {
        let fake = Fake::default();
        let report = publish::publish(
            &fake,
            buckets(vec![(3, vec!["a", "b"]), (4, vec!["c"])]),
            "The Independent",
        )
        .await
        .unwrap();

        assert!(report.ok());
        assert_eq!(report.playlists.len(), 2);
        assert_eq!(report.playlists[0].month, month(3));
        assert_eq!(report.playlists[0].tracks, 2);
        assert_eq!(report.playlists[1].tracks, 1);

        assert_eq!(
            fake.playlists(),
            vec![
                (
                    String::from("user"),
                    String::from("The Independent March.2024"),
                    true
                ),
                (
                    String::from("user"),
                    String::from("The Independent April.2024"),
                    true
                ),
            ]
        );

        let added: Vec<(String, String)> = ["a", "b", "c"]
            .iter()
            .zip(["playlist-1", "playlist-1", "playlist-2"])
            .map(|(t, p)| (p.to_owned(), (*t).to_owned()))
            .collect();
        assert_eq!(fake.added(), added);
    }

    #[tokio::test]
    async fn failed_creation_skips_the_month() {
        let fake = Fake::default().failing("The Independent March.2024");
        let report = publish::publish(
            &fake,
            buckets(vec![(3, vec!["a"]), (4, vec!["b"])]),
            "The Independent",
        )
        .await
        .unwrap();

        assert!(!report.ok());
        assert_eq!(report.playlists.len(), 1);
        assert_eq!(report.playlists[0].month, month(4));
        assert!(matches!(report.failures[..], [Error::Create { .. }]));
    }

    #[tokio::test]
    async fn failed_track_keeps_adding() {
        let fake = Fake::default().failing("b");
        let report = publish::publish(&fake, buckets(vec![(3, vec!["a", "b", "c"])]), "Venue")
            .await
            .unwrap();

        assert!(!report.ok());
        assert_eq!(report.playlists[0].tracks, 2);
        assert!(matches!(
            &report.failures[..],
            [Error::Add { track, .. }] if track == "b"
        ));

        let tracks: Vec<String> = fake.added().into_iter().map(|(_, t)| t).collect();
        assert_eq!(tracks, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn no_user_is_fatal() {
        let fake = Fake {
            anonymous: true,
            ..Fake::default()
        };

        let result = publish::publish(&fake, buckets(vec![(3, vec!["a"])]), "Venue").await;
        assert!(matches!(result, Err(Error::User(_))));
        assert!(fake.playlists().is_empty());
    }
}
