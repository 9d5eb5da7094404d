//! SCORM 1.2 `imsmanifest.xml`.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::descriptor::PackageDescriptor;
use crate::error::Result;

/// Manifest file name at the archive root.
pub const MANIFEST_FILE: &str = "imsmanifest.xml";

const IMSCP_NS: &str = "http://www.imsproject.org/xsd/imscp_rootv1p1p2";
const ADLCP_NS: &str = "http://www.adlnet.org/xsd/adlcp_rootv1p2";
const IMSMD_NS: &str = "http://www.imsglobal.org/xsd/imsmd_rootv1p2p1";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str = "http://www.imsproject.org/xsd/imscp_rootv1p1p2 imscp_rootv1p1p2.xsd \
http://www.imsglobal.org/xsd/imsmd_rootv1p2p1 imsmd_rootv1p2p1.xsd \
http://www.adlnet.org/xsd/adlcp_rootv1p2 adlcp_rootv1p2.xsd";

/// Render the manifest for `descriptor` listing `files` (archive paths).
pub fn render_manifest(descriptor: &PackageDescriptor, files: &[String]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let id = &descriptor.identifier;
    let organization_id = format!("ORG-{id}");
    let item_id = format!("ITEM-{id}");
    let resource_id = format!("RES-{id}");

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("manifest").with_attributes([
        ("identifier", id.as_str()),
        ("version", "1"),
        ("xmlns", IMSCP_NS),
        ("xmlns:adlcp", ADLCP_NS),
        ("xmlns:xsi", XSI_NS),
        ("xsi:schemaLocation", SCHEMA_LOCATION),
    ])))?;

    // Package metadata
    start(&mut writer, "metadata")?;
    text_element(&mut writer, "schema", "ADL SCORM")?;
    text_element(&mut writer, "schemaversion", &descriptor.version)?;
    writer.write_event(Event::Start(
        BytesStart::new("lom").with_attributes([("xmlns", IMSMD_NS)]),
    ))?;
    start(&mut writer, "general")?;
    start(&mut writer, "title")?;
    writer.write_event(Event::Start(
        BytesStart::new("langstring").with_attributes([("xml:lang", descriptor.language.as_str())]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(&descriptor.title)))?;
    end(&mut writer, "langstring")?;
    end(&mut writer, "title")?;
    text_element(&mut writer, "language", &descriptor.language)?;
    end(&mut writer, "general")?;
    end(&mut writer, "lom")?;
    end(&mut writer, "metadata")?;

    // Organization with a single SCO item
    writer.write_event(Event::Start(
        BytesStart::new("organizations").with_attributes([("default", organization_id.as_str())]),
    ))?;
    writer.write_event(Event::Start(
        BytesStart::new("organization").with_attributes([("identifier", organization_id.as_str())]),
    ))?;
    text_element(&mut writer, "title", &descriptor.organization)?;
    writer.write_event(Event::Start(BytesStart::new("item").with_attributes([
        ("identifier", item_id.as_str()),
        ("identifierref", resource_id.as_str()),
        ("isvisible", "true"),
    ])))?;
    text_element(&mut writer, "title", &descriptor.title)?;
    text_element(
        &mut writer,
        "adlcp:masteryscore",
        &descriptor.mastery_score.to_string(),
    )?;
    end(&mut writer, "item")?;
    end(&mut writer, "organization")?;
    end(&mut writer, "organizations")?;

    // One resource carrying every file
    start(&mut writer, "resources")?;
    writer.write_event(Event::Start(BytesStart::new("resource").with_attributes([
        ("identifier", resource_id.as_str()),
        ("type", "webcontent"),
        ("adlcp:scormtype", "sco"),
        ("href", descriptor.starting_page.as_str()),
    ])))?;
    for file in files {
        writer.write_event(Event::Empty(
            BytesStart::new("file").with_attributes([("href", file.as_str())]),
        ))?;
    }
    end(&mut writer, "resource")?;
    end(&mut writer, "resources")?;
    end(&mut writer, "manifest")?;

    let mut xml = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    xml.push('\n');
    Ok(xml)
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    start(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn descriptor(title: &str) -> PackageDescriptor {
        let date = NaiveDate::from_ymd_opt(2022, 5, 10).unwrap();
        PackageDescriptor::new(title, "Jane Roe", "de", 75.5, "/tmp", date)
    }

    #[test]
    fn test_manifest_contents() {
        let files = vec!["index.html".to_string(), "img/a.png".to_string()];
        let xml = render_manifest(&descriptor("Agamotto"), &files).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<manifest identifier="00" version="1""#));
        assert!(xml.contains("<schemaversion>1.2</schemaversion>"));
        assert!(xml.contains("<title>Jane Roe</title>"));
        assert!(xml.contains("<title>Agamotto</title>"));
        assert!(xml.contains("<adlcp:masteryscore>75.5</adlcp:masteryscore>"));
        assert!(xml.contains("<language>de</language>"));
        assert!(xml.contains(r#"adlcp:scormtype="sco" href="index.html""#));
        assert!(xml.contains(r#"<file href="img/a.png"/>"#));
    }

    #[test]
    fn test_manifest_escapes_text() {
        let xml = render_manifest(&descriptor("Fish & <Chips>"), &[]).unwrap();
        assert!(xml.contains("Fish &amp; &lt;Chips&gt;"));
        assert!(!xml.contains("<Chips>"));
    }

    #[test]
    fn test_whole_number_mastery_score() {
        let mut d = descriptor("Quiz");
        d.mastery_score = 80.0;
        let xml = render_manifest(&d, &[]).unwrap();
        assert!(xml.contains("<adlcp:masteryscore>80</adlcp:masteryscore>"));
    }
}
