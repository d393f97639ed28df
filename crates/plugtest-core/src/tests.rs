use std::fs;
use std::path::{Path, PathBuf};

use super::*;

fn test_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    std::env::temp_dir().join(format!("plugtest-core-{name}-{nanos}"))
}

#[test]
fn parse_full_descriptor() {
    let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>example-parent</artifactId>
    <version>3</version>
    <relativePath>../parent/pom.xml</relativePath>
  </parent>
  <groupId>org.example.plugins</groupId>
  <artifactId>demo-maven-plugin</artifactId>
  <version>1.0-SNAPSHOT</version>
  <packaging>maven-plugin</packaging>
  <dependencies>
    <dependency>
      <groupId>org.other</groupId>
      <artifactId>lib</artifactId>
      <version>9</version>
    </dependency>
  </dependencies>
</project>
"#;

    let model = PomModel::from_xml_str(content).expect("descriptor should parse");
    assert_eq!(model.group_id.as_deref(), Some("org.example.plugins"));
    assert_eq!(model.artifact_id.as_deref(), Some("demo-maven-plugin"));
    assert_eq!(model.version.as_deref(), Some("1.0-SNAPSHOT"));
    assert_eq!(model.packaging.as_deref(), Some("maven-plugin"));

    let parent = model.parent.as_ref().expect("parent declared");
    assert_eq!(parent.group_id.as_deref(), Some("org.example"));
    assert_eq!(parent.artifact_id.as_deref(), Some("example-parent"));
    assert_eq!(parent.version.as_deref(), Some("3"));
    assert_eq!(parent.relative_path, "../parent/pom.xml");
}

#[test]
fn dependency_coordinates_do_not_leak_into_project() {
    let content = r#"<project>
  <dependencies>
    <dependency><groupId>org.other</groupId><artifactId>lib</artifactId></dependency>
  </dependencies>
  <artifactId>child</artifactId>
</project>"#;

    let model = PomModel::from_xml_str(content).expect("descriptor should parse");
    assert_eq!(model.group_id, None);
    assert_eq!(model.artifact_id.as_deref(), Some("child"));
}

#[test]
fn coordinates_inherit_from_parent() {
    let content = r#"<project>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>root</artifactId>
    <version>2.1</version>
  </parent>
  <artifactId>child</artifactId>
</project>"#;

    let model = PomModel::from_xml_str(content).expect("descriptor should parse");
    let coordinates = model.coordinates().expect("coordinates resolve");
    assert_eq!(coordinates, Coordinates::new("org.example", "child", "2.1"));
    assert_eq!(
        model.parent.as_ref().map(|parent| parent.relative_path.as_str()),
        Some(DEFAULT_PARENT_RELATIVE_PATH)
    );
}

#[test]
fn own_coordinates_win_over_parent() {
    let content = r#"<project>
  <parent><groupId>org.example</groupId><artifactId>root</artifactId><version>2.1</version></parent>
  <groupId>org.child</groupId>
  <artifactId>child</artifactId>
  <version>5</version>
</project>"#;

    let model = PomModel::from_xml_str(content).expect("descriptor should parse");
    assert_eq!(model.effective_group_id(), Some("org.child"));
    assert_eq!(model.effective_version(), Some("5"));
}

#[test]
fn coordinates_require_artifact_id() {
    let model = PomModel::from_xml_str("<project><groupId>g</groupId><version>1</version></project>")
        .expect("descriptor should parse");
    let err = model.coordinates().expect_err("artifactId is required");
    assert!(err.to_string().contains("artifactId"));
}

#[test]
fn coordinates_require_version_without_parent() {
    let model =
        PomModel::from_xml_str("<project><groupId>g</groupId><artifactId>a</artifactId></project>")
            .expect("descriptor should parse");
    let err = model.coordinates().expect_err("version is required");
    assert!(err.to_string().contains("no version"));
}

#[test]
fn empty_relative_path_disables_lookup() {
    let content = r#"<project>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>root</artifactId>
    <version>1</version>
    <relativePath/>
  </parent>
  <artifactId>child</artifactId>
</project>"#;

    let model = PomModel::from_xml_str(content).expect("descriptor should parse");
    assert_eq!(
        model.parent.as_ref().map(|parent| parent.relative_path.as_str()),
        Some("")
    );
    assert_eq!(model.parent_pom_path(Path::new("/work/child/pom.xml")), None);
}

#[test]
fn parent_path_resolves_against_descriptor_directory() {
    let model = PomModel::from_xml_str(
        "<project><parent><relativePath>../base/parent.xml</relativePath></parent><artifactId>a</artifactId></project>",
    )
    .expect("descriptor should parse");
    assert_eq!(
        model.parent_pom_path(Path::new("/work/child/pom.xml")),
        Some(PathBuf::from("/work/child/../base/parent.xml"))
    );
}

#[test]
fn parent_path_naming_directory_resolves_to_pom_xml() {
    let root = test_dir("parent-dir");
    let child = root.join("child");
    fs::create_dir_all(&child).expect("must create dirs");

    let model = PomModel::from_xml_str(
        "<project><parent><relativePath>..</relativePath></parent><artifactId>a</artifactId></project>",
    )
    .expect("descriptor should parse");
    assert_eq!(
        model.parent_pom_path(&child.join("pom.xml")),
        Some(child.join("..").join("pom.xml"))
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn no_parent_means_no_parent_path() {
    let model = PomModel::from_xml_str("<project><artifactId>a</artifactId></project>")
        .expect("descriptor should parse");
    assert_eq!(model.parent, None);
    assert_eq!(model.parent_pom_path(Path::new("pom.xml")), None);
}

#[test]
fn reject_non_project_root() {
    let err = PomModel::from_xml_str("<settings/>").expect_err("root must be project");
    assert!(err.to_string().contains("<settings>"));
}

#[test]
fn reject_malformed_descriptor() {
    let err = PomModel::from_xml_str("<project><artifactId>a</project>")
        .expect_err("mismatched tags must fail");
    assert!(format!("{err:#}").contains("failed to parse project descriptor"));
}

#[test]
fn read_reports_missing_file() {
    let path = test_dir("missing").join("pom.xml");
    let err = PomModel::read(&path).expect_err("missing file must fail");
    assert!(err.to_string().contains("failed to read project descriptor"));
}

#[test]
fn xml_document_unescapes_and_collects_repeated_elements() {
    let document = XmlDocument::parse(
        "<metadata><versioning><versions><version>1 &amp; 2</version><version>3</version></versions></versioning></metadata>",
    )
    .expect("document should parse");
    assert_eq!(document.root(), "metadata");
    assert_eq!(
        document
            .texts("metadata/versioning/versions/version")
            .collect::<Vec<_>>(),
        vec!["1 & 2", "3"]
    );
}

#[test]
fn xml_document_rejects_empty_input() {
    let err = XmlDocument::parse("  ").expect_err("empty input has no root");
    assert!(err.to_string().contains("no root element"));
}

#[test]
fn escape_text_escapes_markup() {
    assert_eq!(escape_text("a<b>&c"), "a&lt;b&gt;&amp;c");
}

#[test]
fn default_layout_file_names() {
    let jar = Artifact::new("org.example", "demo", "1.0", "maven-plugin");
    assert_eq!(jar.file_name(), "demo-1.0.jar");
    assert_eq!(jar.pom_file_name(), "demo-1.0.pom");

    let tests = Artifact::new("org.example", "demo", "1.0", "test-jar");
    assert_eq!(tests.file_name(), "demo-1.0-tests.jar");

    let explicit = Artifact::new("org.example", "demo", "1.0", "jar").with_classifier("linux");
    assert_eq!(explicit.file_name(), "demo-1.0-linux.jar");
    assert_eq!(explicit.to_string(), "org.example:demo:jar:linux:1.0");

    let project = Artifact::project("org.example", "root", "3");
    assert!(project.is_pom());
    assert_eq!(project.file_name(), "root-3.pom");
}

#[test]
fn unknown_packaging_uses_its_own_extension() {
    assert_eq!(packaging_extension("war"), "war");
    assert_eq!(packaging_extension("ejb"), "jar");
}

#[test]
fn validate_rejects_empty_and_path_like_coordinates() {
    assert!(Artifact::new("org.example", "demo", "1.0", "jar")
        .validate()
        .is_ok());
    assert!(Artifact::new("", "demo", "1.0", "jar").validate().is_err());
    assert!(Artifact::new("org.example", "../demo", "1.0", "jar")
        .validate()
        .is_err());
}

#[test]
fn decode_xml_honours_declared_encoding() {
    let mut bytes = b"<?xml version='1.0' encoding='ISO-8859-1'?><name>Caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"</name>");

    let text = decode_xml(&bytes).expect("latin-1 document decodes");
    let document = XmlDocument::parse(&text).expect("document should parse");
    assert_eq!(document.text("name"), Some("Café"));
}

#[test]
fn decode_xml_defaults_to_utf8_and_strips_bom() {
    assert_eq!(decode_xml(b"<a/>").expect("plain utf-8"), "<a/>");
    assert_eq!(
        decode_xml(b"\xEF\xBB\xBF<?xml version=\"1.0\"?><a/>").expect("utf-8 with bom"),
        "<?xml version=\"1.0\"?><a/>"
    );

    let err = decode_xml(b"<a>\xE9</a>").expect_err("undeclared latin-1 is not utf-8");
    assert!(err.to_string().contains("not valid UTF-8"));
}

#[test]
fn decode_xml_rejects_unknown_encoding() {
    let err = decode_xml(b"<?xml version=\"1.0\" encoding=\"EBCDIC-XYZ\"?><a/>")
        .expect_err("unknown label must fail");
    assert!(err.to_string().contains("unsupported XML encoding 'EBCDIC-XYZ'"));
}

#[test]
fn read_latin1_descriptor() {
    let dir = test_dir("latin1");
    fs::create_dir_all(&dir).expect("must create dirs");
    let path = dir.join("pom.xml");
    let mut bytes =
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<project><description>r".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(
        b"sum\xE9</description><groupId>org.example</groupId>\
          <artifactId>root</artifactId><version>1</version></project>",
    );
    fs::write(&path, bytes).expect("must write descriptor");

    let model = PomModel::read(&path).expect("latin-1 descriptor should read");
    assert_eq!(
        model.coordinates().expect("coordinates resolve"),
        Coordinates::new("org.example", "root", "1")
    );

    let _ = fs::remove_dir_all(&dir);
}
