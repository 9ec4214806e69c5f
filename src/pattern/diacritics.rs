//! 变音符等价类

const CASE_SENSITIVE: &[&str] = &[
    "aàáảãạăằắẳẵặâầấẩẫậäåāą",
    "AÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬÄÅĀĄ",
    "cçćč",
    "CÇĆČ",
    "dđď",
    "DĐĎ",
    "eèéẻẽẹêềếểễệëěēę",
    "EÈÉẺẼẸÊỀẾỂỄỆËĚĒĘ",
    "iìíỉĩịîïī",
    "IÌÍỈĨỊÎÏĪ",
    "lł",
    "LŁ",
    "nñňń",
    "NÑŇŃ",
    "oòóỏõọôồốổỗộơởỡớờợöøō",
    "OÒÓỎÕỌÔỒỐỔỖỘƠỞỠỚỜỢÖØŌ",
    "rř",
    "RŘ",
    "sšśșş",
    "SŠŚȘŞ",
    "tťțţ",
    "TŤȚŢ",
    "uùúủũụưừứửữựûüůū",
    "UÙÚỦŨỤƯỪỨỬỮỰÛÜŮŪ",
    "yýỳỷỹỵÿ",
    "YÝỲỶỸỴŸ",
    "zžżź",
    "ZŽŻŹ",
];

const CASE_INSENSITIVE: &[&str] = &[
    "aàáảãạăằắẳẵặâầấẩẫậäåāąAÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬÄÅĀĄ",
    "cçćčCÇĆČ",
    "dđďDĐĎ",
    "eèéẻẽẹêềếểễệëěēęEÈÉẺẼẸÊỀẾỂỄỆËĚĒĘ",
    "iìíỉĩịîïīIÌÍỈĨỊÎÏĪ",
    "lłLŁ",
    "nñňńNÑŇŃ",
    "oòóỏõọôồốổỗộơởỡớờợöøōOÒÓỎÕỌÔỒỐỔỖỘƠỞỠỚỜỢÖØŌ",
    "rřRŘ",
    "sšśșşSŠŚȘŞ",
    "tťțţTŤȚŢ",
    "uùúủũụưừứửữựûüůūUÙÚỦŨỤƯỪỨỬỮỰÛÜŮŪ",
    "yýỳỷỹỵÿYÝỲỶỸỴŸ",
    "zžżźZŽŻŹ",
];

/// Equivalence class containing `ch`, if any.
pub fn class_of(ch: char, case_sensitive: bool) -> Option<&'static str> {
    let table = if case_sensitive {
        CASE_SENSITIVE
    } else {
        CASE_INSENSITIVE
    };
    table.iter().copied().find(|class| class.contains(ch))
}

/// Replaces every foldable character outside of escape sequences with a
/// bracket class of its equivalents.
pub fn fold(pattern: &str, case_sensitive: bool) -> String {
    let mut out = String::with_capacity(pattern.len() * 4);
    let mut escaped = false;
    for ch in pattern.chars() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        if ch == '\\' {
            escaped = true;
            out.push(ch);
            continue;
        }
        match class_of(ch, case_sensitive) {
            Some(class) => {
                out.push('[');
                out.push_str(class);
                out.push(']');
            }
            None => out.push(ch),
        }
    }
    out
}
