use log::debug;

use crate::meetup::Rsvp;

/// 参加者（プロフィール名, 質問への回答）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    /// プロフィール上の名前
    pub name: String,

    /// 最初の質問への回答（多くの場合は本名）
    pub answer: String,
}

/// 句読点・記号を空白に置き換え、前後の空白を取り除く
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// "yes" のRSVPだけを参加者に変換し、回答順に並べる
pub fn collect_attendees(rsvps: &[Rsvp]) -> Vec<Attendee> {
    let mut attendees: Vec<Attendee> = rsvps
        .iter()
        .filter(|rsvp| rsvp.is_yes())
        .map(|rsvp| Attendee {
            name: normalize_name(&rsvp.member.name),
            answer: normalize_name(rsvp.first_answer()),
        })
        .collect();

    // 安定ソート
    attendees.sort_by(|a, b| a.answer.cmp(&b.answer));

    debug!(
        "{} of {} RSVPs are attending",
        attendees.len(),
        rsvps.len()
    );
    attendees
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meetup::Member;

    fn rsvp(response: &str, name: &str, answer: Option<&str>) -> Rsvp {
        Rsvp {
            response: response.to_string(),
            member: Member { name: name.to_string() },
            answers: answer.map(|a| vec![a.to_string()]),
        }
    }

    #[test]
    fn test_punctuation_becomes_space() {
        assert_eq!(normalize_name("Jo, Smith!"), "Jo  Smith");
        assert_eq!(normalize_name("O'Brien"), "O Brien");
        assert_eq!(normalize_name("\"Quoted\""), "Quoted");
    }

    #[test]
    fn test_clean_name_is_unchanged() {
        for name in ["Jo Smith", "Ana María", "李 小龍", ""] {
            assert_eq!(normalize_name(name), name);
            assert_eq!(normalize_name(&normalize_name(name)), normalize_name(name));
        }
    }

    #[test]
    fn test_only_yes_rsvps_are_kept() {
        let rsvps = vec![
            rsvp("yes", "A", Some("Alpha")),
            rsvp("no", "B", Some("Beta")),
            rsvp("waitlist", "C", None),
            rsvp("yes", "D", None),
            rsvp("yes", "A", Some("Alpha")),
        ];

        let attendees = collect_attendees(&rsvps);

        assert_eq!(attendees.len(), 3);
        assert_eq!(attendees.iter().filter(|a| a.name == "A").count(), 2);
        assert!(attendees.iter().all(|a| a.name != "B" && a.name != "C"));
    }

    #[test]
    fn test_sorted_by_answer_with_empty_first() {
        let rsvps = vec![
            rsvp("yes", "z", Some("Zed Last")),
            rsvp("yes", "m", Some("Mid Person")),
            rsvp("yes", "none", None),
            rsvp("yes", "a", Some("Abe First")),
        ];

        let answers: Vec<String> = collect_attendees(&rsvps)
            .into_iter()
            .map(|a| a.answer)
            .collect();

        assert_eq!(answers, vec!["", "Abe First", "Mid Person", "Zed Last"]);
    }

    #[test]
    fn test_equal_answers_keep_input_order() {
        let rsvps = vec![
            rsvp("yes", "second", None),
            rsvp("yes", "first", None),
        ];

        let names: Vec<String> = collect_attendees(&rsvps)
            .into_iter()
            .map(|a| a.name)
            .collect();

        assert_eq!(names, vec!["second", "first"]);
    }
}
