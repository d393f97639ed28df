mod artifact;
mod pom;
mod xml;

pub use artifact::{packaging_extension, Artifact, Coordinates};
pub use pom::{PomModel, PomParent, DEFAULT_PARENT_RELATIVE_PATH};
pub use xml::{decode_xml, escape_text, read_xml_file, XmlDocument};

#[cfg(test)]
mod tests;
