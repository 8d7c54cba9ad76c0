//! Engine instructions and the JSON schemas attached to them.

use serde_json::{json, Value};

const EXTRACT_SYSTEM: &str = "あなたは自治体窓口のAIです。ユーザー発話から粗大ごみ申込情報を抽出し、\
必ず JSON のみで出力します。説明文やコードブロックは禁止。";

const DIALOGUE_SYSTEM: &str = "あなたは自治体の粗大ごみ申込アシスタントです。\
申込内容の判断はすでにシステムが済ませています。あなたの役割は、与えられた判断と下書きを、\
住民に向けた丁寧で簡潔な日本語に言い換えることだけです。\n\
【厳守】\n\
- kind は判断のとおりにする（ask / review / answer）。\n\
- ask では下書きが尋ねている1項目だけを質問する。別の項目を尋ねない。\n\
- 下書きに含まれる日付・金額・受付条件・理由は変えずにそのまま含める。\n\
- 申込情報を推測で補わない。record には住民が明言した値だけを入れ、不明は null。\n\
- 出力は JSON オブジェクトのみ：{\"kind\": \"...\", \"message\": \"...\", \"record\": {...}}";

/// System messages for the extraction call.
pub fn extraction_system(today_iso: &str) -> Vec<String> {
    vec![
        format!(
            "{EXTRACT_SYSTEM}\n出力は次の JSON Schema に従うこと：\n{}",
            record_schema()
        ),
        format!(
            "不明は null のままでよい。電話は数字のみ。time_slot は『午前/午後』。\
             相対日付は日本時間の本日 {today_iso} 基準で YYYY-MM-DD に正規化する。"
        ),
    ]
}

pub fn dialogue_system() -> &'static str {
    DIALOGUE_SYSTEM
}

/// Schema of the record patch the extractor must emit.
pub fn record_schema() -> Value {
    let text = json!({"type": ["string", "null"]});
    json!({
        "type": "object",
        "properties": {
            "name": {"type": ["string", "null"], "description": "カタカナ氏名"},
            "address": {"type": ["string", "null"], "description": "市区町村〜番地"},
            "phone": {"type": ["string", "null"], "description": "数字のみ"},
            "item_description": {"type": ["string", "null"], "description": "品目"},
            "quantity": {"type": ["integer", "null"], "description": "個数"},
            "preferred_date": {"type": ["string", "null"], "description": "YYYY-MM-DD"},
            "time_slot": {"type": ["string", "null"], "enum": ["午前", "午後", null]},
            "pickup_location": {"type": ["string", "null"], "description": "自宅前/集合所"},
            "notes": text,
        },
        "additionalProperties": false
    })
}

/// Schema of the structured phrasing reply.
pub fn reply_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "kind": {"type": "string", "enum": ["ask", "review", "answer"]},
            "message": {"type": "string"},
            "record": record_schema(),
        },
        "required": ["kind", "message"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_pins_reference_date() {
        let msgs = extraction_system("2025-08-20");
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].contains("JSON のみ"));
        assert!(msgs[0].contains("preferred_date"));
        assert!(msgs[1].contains("本日 2025-08-20 基準"));
    }

    #[test]
    fn reply_schema_requires_kind_and_message() {
        let schema = reply_schema();
        assert_eq!(schema["required"], json!(["kind", "message"]));
        assert_eq!(schema["properties"]["record"]["type"], "object");
    }
}
