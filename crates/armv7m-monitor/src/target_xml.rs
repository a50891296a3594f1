//! GDB target description (`qXfer:features:read:target.xml`)
//!
//! Assembled at compile time from the feature blocks under `xml/`, so the
//! register list GDB is told about always matches the context layout of the
//! same build.

macro_rules! target_xml {
    ($($feature:literal),*) => {
        concat!(
            include_str!("xml/header.xml"),
            include_str!("xml/m-profile.xml"),
            $(include_str!($feature),)*
            include_str!("xml/footer.xml"),
        )
    };
}

/// The complete target description.
#[cfg(all(not(feature = "task-aware"), not(feature = "fpu")))]
pub const TARGET_XML: &str = target_xml!("xml/m-system.xml");
/// The complete target description.
#[cfg(all(not(feature = "task-aware"), feature = "fpu"))]
pub const TARGET_XML: &str = target_xml!("xml/m-system.xml", "xml/vfp.xml");
/// The complete target description.
#[cfg(all(feature = "task-aware", not(feature = "fpu")))]
pub const TARGET_XML: &str = target_xml!();
/// The complete target description.
#[cfg(all(feature = "task-aware", feature = "fpu"))]
pub const TARGET_XML: &str = target_xml!("xml/vfp.xml");

/// Size of [`TARGET_XML`] in bytes, without any terminator.
pub const fn target_xml_size() -> usize {
    TARGET_XML.len()
}
