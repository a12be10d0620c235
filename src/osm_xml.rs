//! Reading OSM XML documents and writing the XML payloads of the editing API.

use std::io::BufRead;

use log::warn;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::data::osm::{MapCoords, Node, OsmId, Way};
use crate::data::OsmMapData;
use crate::errors::Result;

pub const API_VERSION: &str = "0.6";

fn parse_node(el: &BytesStart) -> Result<Option<Node>> {
    let mut id: Option<OsmId> = None;
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        let value = attribute.unescape_value()?;
        match attribute.key.as_ref() {
            b"id" => id = Some(value.parse()?),
            b"lat" => lat = Some(value.parse()?),
            b"lon" => lon = Some(value.parse()?),
            _ => (),
        }
    }

    // Deleted nodes in history extracts come without coordinates.
    Ok(match (id, lat, lon) {
        (Some(id), Some(lat), Some(lon)) => Some(Node { id, lat, lon }),
        _ => None,
    })
}

fn parse_way_header(el: &BytesStart) -> Result<Way> {
    let mut id: Option<OsmId> = None;
    let mut version: u64 = 1;

    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        let value = attribute.unescape_value()?;
        match attribute.key.as_ref() {
            b"id" => id = Some(value.parse()?),
            b"version" => version = value.parse()?,
            _ => (),
        }
    }

    let id = id.ok_or("Way element without id")?;
    let mut way = Way::new(id, Default::default());
    way.version = version;
    Ok(way)
}

fn parse_way_child(el: &BytesStart, way: &mut Way) -> Result<()> {
    match el.name().as_ref() {
        b"nd" => {
            let node_ref = el.try_get_attribute("ref")?
                .ok_or("nd element without ref")?;
            way.nodes.push(node_ref.unescape_value()?.parse()?);
        },
        b"tag" => {
            let key = el.try_get_attribute("k")?.ok_or("tag element without k")?;
            let value = el.try_get_attribute("v")?.ok_or("tag element without v")?;
            way.tags.insert(key.unescape_value()?.into_owned(), value.unescape_value()?.into_owned());
        },
        _ => (),
    }
    Ok(())
}

fn resolve_geometry(data: &mut OsmMapData) {
    let nodes = &data.nodes;
    for way in data.ways.values_mut() {
        way.geometry = way.nodes.iter()
            .filter_map(|id| nodes.get(id).map(MapCoords::from))
            .collect();
        let missing = way.nodes.len() - way.geometry.len();
        if missing > 0 {
            warn!(way_id = way.id, missing = missing; "Way references nodes missing from the document");
        }
    }
}

/// Reads nodes and ways of an OSM XML document and resolves way geometry.
pub fn parse_document<R: BufRead>(input: R) -> Result<OsmMapData> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut data = OsmMapData::default();
    let mut current_way: Option<Way> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                match e.name().as_ref() {
                    b"node" => {
                        if let Some(node) = parse_node(&e)? {
                            data.nodes.insert(node.id, node);
                        }
                    },
                    b"way" => current_way = Some(parse_way_header(&e)?),
                    _ => (),
                }
            },
            Event::Empty(e) => {
                match e.name().as_ref() {
                    b"node" => {
                        if let Some(node) = parse_node(&e)? {
                            data.nodes.insert(node.id, node);
                        }
                    },
                    b"way" => {
                        let way = parse_way_header(&e)?;
                        data.ways.insert(way.id, way);
                    },
                    _ => {
                        if let Some(way) = current_way.as_mut() {
                            parse_way_child(&e, way)?;
                        }
                    },
                }
            },
            Event::End(e) => {
                if e.name().as_ref() == b"way" {
                    if let Some(way) = current_way.take() {
                        data.ways.insert(way.id, way);
                    }
                }
            },
            Event::Text(_) => return Err("Didn't expect to see Text in OSM file.".into()),
            _ => (),
        }
        // if we don't keep a borrow elsewhere, we can clear the buffer to keep memory usage low
        buf.clear();
    }

    resolve_geometry(&mut data);
    Ok(data)
}

fn new_writer() -> Writer<Vec<u8>> {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

fn write_root_start(writer: &mut Writer<Vec<u8>>, root: &str, generator: &str) -> Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new(root).with_attributes([("version", API_VERSION), ("generator", generator)])
    ))?;
    Ok(())
}

fn write_tag(writer: &mut Writer<Vec<u8>>, key: &str, value: &str) -> Result<()> {
    writer.write_event(Event::Empty(
        BytesStart::new("tag").with_attributes([("k", key), ("v", value)])
    ))?;
    Ok(())
}

fn write_way(writer: &mut Writer<Vec<u8>>, way: &Way, changeset_id: u64) -> Result<()> {
    let id = way.id.to_string();
    let version = way.version.to_string();
    let changeset = changeset_id.to_string();
    writer.write_event(Event::Start(BytesStart::new("way").with_attributes([
        ("id", id.as_str()),
        ("version", version.as_str()),
        ("changeset", changeset.as_str()),
    ])))?;
    for node_id in &way.nodes {
        let node_ref = node_id.to_string();
        writer.write_event(Event::Empty(
            BytesStart::new("nd").with_attributes([("ref", node_ref.as_str())])
        ))?;
    }
    for (key, value) in &way.tags {
        write_tag(writer, key, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new("way")))?;
    Ok(())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let xml = String::from_utf8(writer.into_inner())
        .map_err(|err| err.to_string())?;
    Ok(xml)
}

/// Body of the changeset creation request.
pub fn write_changeset_create(comment: &str, generator: &str) -> Result<String> {
    let mut writer = new_writer();
    write_root_start(&mut writer, "osm", generator)?;
    writer.write_event(Event::Start(BytesStart::new("changeset")))?;
    write_tag(&mut writer, "comment", comment)?;
    write_tag(&mut writer, "created_by", generator)?;
    write_tag(&mut writer, "source", "survey")?;
    writer.write_event(Event::End(BytesEnd::new("changeset")))?;
    writer.write_event(Event::End(BytesEnd::new("osm")))?;
    finish(writer)
}

/// Body of a single way update, carrying the full tag set and node list.
pub fn write_way_update(way: &Way, changeset_id: u64, generator: &str) -> Result<String> {
    let mut writer = new_writer();
    write_root_start(&mut writer, "osm", generator)?;
    write_way(&mut writer, way, changeset_id)?;
    writer.write_event(Event::End(BytesEnd::new("osm")))?;
    finish(writer)
}

/// osmChange document modifying all `ways` in one upload.
pub fn write_osm_change(ways: &[Way], changeset_id: u64, generator: &str) -> Result<String> {
    let mut writer = new_writer();
    write_root_start(&mut writer, "osmChange", generator)?;
    writer.write_event(Event::Start(BytesStart::new("modify")))?;
    for way in ways {
        write_way(&mut writer, way, changeset_id)?;
    }
    writer.write_event(Event::End(BytesEnd::new("modify")))?;
    writer.write_event(Event::End(BytesEnd::new("osmChange")))?;
    finish(writer)
}
