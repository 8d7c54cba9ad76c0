//! Canned answers to common questions about the service.

const DEFAULT_ANSWER: &str = "市の粗大ごみ案内ページをご確認ください。";

const FAQ: [(&[&str], &str); 5] = [
    (
        &["サイズ", "大きさ"],
        "最大辺が2mを超えるものは個別相談となります。詳しくは市の案内をご参照ください。",
    ),
    (
        &["テレビ", "冷蔵庫", "洗濯機", "エアコン", "家電"],
        "テレビ・冷蔵庫・洗濯機・エアコンは家電リサイクル法の対象のため、粗大ごみとしては回収できません。購入店などにご相談ください。",
    ),
    (
        &["料金", "値段", "いくら", "費用"],
        "料金は品目ごとに決まっています（例：ソファ1,200円、マットレス800円、机700円、椅子300円、その他500円）。",
    ),
    (
        &["支払", "払い", "処理券", "シール"],
        "手数料は回収日までに取扱店で粗大ごみ処理券を購入し、品物の見やすい所に貼ってお出しください。",
    ),
    (
        &["日曜", "祝日", "年末", "正月"],
        "日曜日と1月1日・12月31日は回収を行っていません。",
    ),
];

/// Keyword lookup over the FAQ; the first matching entry wins.
pub fn rag_search(query: &str) -> String {
    FAQ.iter()
        .find(|(keys, _)| keys.iter().any(|k| query.contains(k)))
        .map(|(_, answer)| *answer)
        .unwrap_or(DEFAULT_ANSWER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_question() {
        assert_eq!(
            rag_search("どのくらいのサイズまで出せますか？"),
            "最大辺が2mを超えるものは個別相談となります。詳しくは市の案内をご参照ください。"
        );
        assert!(rag_search("大きさの制限は？").starts_with("最大辺が2m"));
    }

    #[test]
    fn unknown_topic_falls_back() {
        assert_eq!(rag_search("駐車場はありますか"), DEFAULT_ANSWER);
    }

    #[test]
    fn appliance_question() {
        assert!(rag_search("冷蔵庫も回収してもらえますか").contains("家電リサイクル法"));
    }
}
