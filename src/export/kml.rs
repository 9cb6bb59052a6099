//! KML export
//!
//! One circle placemark per network, coloured by how recently WiGLE saw
//! an update for it.

use crate::error::WigleError;
use crate::wigle::NetworkRecord;
use chrono::{Months, NaiveDate};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

const CIRCLE_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/placemark_circle.png";

/// Icon style of a placemark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Updated within the last 12 months
    Green,
    /// Updated 12 to 18 months ago
    Amber,
    /// Older, or no usable date
    Red,
}

impl MarkerStyle {
    pub const ALL: [MarkerStyle; 3] = [MarkerStyle::Green, MarkerStyle::Amber, MarkerStyle::Red];

    pub fn id(self) -> &'static str {
        match self {
            MarkerStyle::Green => "green",
            MarkerStyle::Amber => "amber",
            MarkerStyle::Red => "red",
        }
    }

    /// KML colour, aabbggrr
    pub fn color(self) -> &'static str {
        match self {
            MarkerStyle::Green => "ff008000",
            MarkerStyle::Amber => "ff00a5ff",
            MarkerStyle::Red => "ff0000ff",
        }
    }

    /// Pick a style from a `lastupdt` value. Boundary days keep the
    /// fresher colour.
    pub fn for_last_update(last_update: Option<&str>, today: NaiveDate) -> Self {
        let Some(updated) = last_update.and_then(parse_date) else {
            return MarkerStyle::Red;
        };

        let is_since = |months: u32| {
            today
                .checked_sub_months(Months::new(months))
                .map_or(false, |cutoff| updated >= cutoff)
        };

        if is_since(12) {
            MarkerStyle::Green
        } else if is_since(18) {
            MarkerStyle::Amber
        } else {
            MarkerStyle::Red
        }
    }
}

/// Calendar date of a WiGLE timestamp such as `2019-03-15T12:00:00.000Z`
fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim().get(..10)?, "%Y-%m-%d").ok()
}

pub fn export_kml<P: AsRef<Path>>(
    records: &[NetworkRecord],
    path: P,
    today: NaiveDate,
) -> Result<(), WigleError> {
    if records.is_empty() {
        return Err(WigleError::NoDataToExport);
    }
    write_kml(records, BufWriter::new(File::create(path)?), today)
}

pub fn write_kml<W: Write>(
    records: &[NetworkRecord],
    writer: W,
    today: NaiveDate,
) -> Result<(), WigleError> {
    if records.is_empty() {
        return Err(WigleError::NoDataToExport);
    }

    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("kml");
    root.push_attribute(("xmlns", KML_NAMESPACE));
    xml.write_event(Event::Start(root))?;
    xml.write_event(Event::Start(BytesStart::new("Document")))?;

    for style in MarkerStyle::ALL {
        write_style(&mut xml, style)?;
    }
    for record in records {
        write_placemark(&mut xml, record, today)?;
    }

    xml.write_event(Event::End(BytesEnd::new("Document")))?;
    xml.write_event(Event::End(BytesEnd::new("kml")))?;

    let mut inner = xml.into_inner();
    inner.write_all(b"\n")?;
    inner.flush()?;
    Ok(())
}

fn write_style<W: Write>(xml: &mut Writer<W>, style: MarkerStyle) -> Result<(), WigleError> {
    let mut start = BytesStart::new("Style");
    start.push_attribute(("id", style.id()));
    xml.write_event(Event::Start(start))?;
    xml.write_event(Event::Start(BytesStart::new("IconStyle")))?;
    text_element(xml, "color", style.color())?;
    xml.write_event(Event::Start(BytesStart::new("Icon")))?;
    text_element(xml, "href", CIRCLE_ICON)?;
    xml.write_event(Event::End(BytesEnd::new("Icon")))?;
    xml.write_event(Event::End(BytesEnd::new("IconStyle")))?;
    xml.write_event(Event::End(BytesEnd::new("Style")))?;
    Ok(())
}

fn write_placemark<W: Write>(
    xml: &mut Writer<W>,
    record: &NetworkRecord,
    today: NaiveDate,
) -> Result<(), WigleError> {
    let ssid = clean_ssid(record.ssid.as_deref().unwrap_or_default());
    let style = MarkerStyle::for_last_update(record.lastupdt.as_deref(), today);
    let channel = record.channel.map(|c| c.to_string()).unwrap_or_default();
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    xml.write_event(Event::Start(BytesStart::new("Placemark")))?;
    text_element(xml, "name", &ssid)?;
    text_element(xml, "styleUrl", &format!("#{}", style.id()))?;

    xml.write_event(Event::Start(BytesStart::new("ExtendedData")))?;
    let data = [
        ("SSID", ssid.clone()),
        ("Channel", channel),
        ("Encryption", text(&record.encryption)),
        ("Type", text(&record.network_type)),
        ("BSSID", text(&record.netid)),
        ("First Seen", text(&record.firsttime)),
        ("Last Updated", text(&record.lastupdt)),
    ];
    for (name, value) in &data {
        let mut start = BytesStart::new("Data");
        start.push_attribute(("name", *name));
        xml.write_event(Event::Start(start))?;
        text_element(xml, "value", value)?;
        xml.write_event(Event::End(BytesEnd::new("Data")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("ExtendedData")))?;

    // A placemark without coordinates still carries its data
    if let (Some(lat), Some(lon)) = (record.trilat, record.trilong) {
        xml.write_event(Event::Start(BytesStart::new("Point")))?;
        text_element(xml, "coordinates", &format!("{},{}", lon, lat))?;
        xml.write_event(Event::End(BytesEnd::new("Point")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("Placemark")))?;
    Ok(())
}

fn text_element<W: Write>(xml: &mut Writer<W>, name: &str, text: &str) -> Result<(), WigleError> {
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// XML 1.0 cannot carry most control characters
fn clean_ssid(ssid: &str) -> String {
    ssid.chars().filter(|c| !c.is_control()).collect()
}
