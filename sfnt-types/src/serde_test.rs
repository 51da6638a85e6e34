//! ensure serde is working as expected

use super::*;

#[test]
fn test_serde() {
    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq, Eq)]
    struct MyTypes {
        fixed: Fixed,
        gid: GlyphId16,
        offset: Offset16,
        nullable: Nullable<Offset32>,
        tag: Tag,
        version: MajorMinor,
    }

    let my_instance = MyTypes {
        fixed: Fixed::from_f64(521.5),
        gid: GlyphId16::new(69),
        offset: Offset16::new(42),
        nullable: Offset32::new(0).into(),
        tag: Tag::new(b"cool"),
        version: MajorMinor::new(1, 1),
    };

    let dumped = serde_json::to_string(&my_instance).unwrap();
    let loaded: MyTypes = serde_json::from_str(&dumped).unwrap();
    assert_eq!(my_instance, loaded)
}
