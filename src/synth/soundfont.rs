//! SoundFont 2 data model and RIFF loader: samples, zones, instruments and
//! presets, read straight off an `.sf2` file's `sfbk` RIFF tree.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use byteorder::{LittleEndian as LE, ReadBytesExt};
use thiserror::Error;

use super::conversion::amplitude_to_attenuation;
use super::generator::{Generator, GeneratorSet};
use super::modulator::{
    GeneralController, ModParam, ModSpec, ModulatorParameterSet, SourceDirection, SourcePolarity, SourceType,
};

/// SF2's reserved bank number for percussion presets (GM drum kits live
/// here, looked up instead of bank 0 for channel 10).
pub const PERCUSSION_BANK: u16 = 128;

#[derive(Debug, Error)]
pub enum SoundFontError {
    #[error("i/o error reading soundfont: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a RIFF sfbk file")]
    BadMagic,
    #[error("soundfont version {major}.{minor:02} is newer than the supported 2.04")]
    VersionTooNew { major: u16, minor: u16 },
    #[error("soundfont is missing its {0} chunk")]
    MissingChunk(&'static str),
    #[error("soundfont chunk runs past the end of the file")]
    Truncated,
    #[error("malformed {0} record")]
    MalformedRecord(&'static str),
    #[error("bag generator/modulator indices are not monotonically increasing")]
    NonMonotonicBag,
    #[error("zone does not end with its expected terminating generator")]
    ZoneMissingTerminator,
    #[error("bag index out of range")]
    BagIndexOutOfRange,
    #[error("sample data chunk is empty")]
    EmptySampleData,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: i8,
    pub max: i8,
}

impl Default for Range {
    fn default() -> Self {
        Range { min: 0, max: 127 }
    }
}

impl Range {
    pub fn contains(&self, value: i8) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug)]
pub struct Sample {
    pub name: String,
    pub start: u32,
    pub end: u32,
    pub start_loop: u32,
    pub end_loop: u32,
    pub sample_rate: u32,
    pub original_key: i8,
    pub correction: i8,
    pub min_atten: f64,
    pub buffer: Arc<Vec<i16>>,
}

impl Sample {
    fn new(
        name: String,
        start: u32,
        end: u32,
        start_loop: u32,
        end_loop: u32,
        sample_rate: u32,
        original_key: i8,
        correction: i8,
        buffer: Arc<Vec<i16>>,
    ) -> Self {
        let min_atten = if start >= end || end as usize > buffer.len() {
            f64::INFINITY
        } else {
            let peak = buffer[start as usize..end as usize]
                .iter()
                .map(|s| s.unsigned_abs())
                .max()
                .unwrap_or(0);
            amplitude_to_attenuation(peak as f64 / i16::MAX as f64)
        };
        Sample { name, start, end, start_loop, end_loop, sample_rate, original_key, correction, min_atten, buffer }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Zone {
    pub key_range: Range,
    pub velocity_range: Range,
    pub generators: GeneratorSet,
    pub modulator_parameters: ModulatorParameterSet,
}

impl Zone {
    pub fn is_in_range(&self, key: i8, velocity: i8) -> bool {
        self.key_range.contains(key) && self.velocity_range.contains(velocity)
    }

    pub fn instrument_index(&self) -> Option<u16> {
        self.generators.is_used(Generator::Instrument).then(|| self.generators.get_or_default(Generator::Instrument) as u16)
    }

    pub fn sample_index(&self) -> Option<u16> {
        self.generators.is_used(Generator::SampleID).then(|| self.generators.get_or_default(Generator::SampleID) as u16)
    }
}

#[derive(Debug)]
pub struct Instrument {
    pub name: String,
    pub zones: Vec<Zone>,
}

#[derive(Debug)]
pub struct Preset {
    pub name: String,
    pub bank: u16,
    pub preset_id: u16,
    pub zones: Vec<Zone>,
}

#[derive(Debug)]
pub struct SoundFont {
    pub name: String,
    samples: Vec<Arc<Sample>>,
    instruments: Vec<Instrument>,
    presets: Vec<Preset>,
}

impl SoundFont {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<SoundFont, SoundFontError> {
        let data = std::fs::read(path)?;
        parse(&data)
    }

    pub fn samples(&self) -> &[Arc<Sample>] {
        &self.samples
    }

    pub fn sample(&self, index: u16) -> Option<&Arc<Sample>> {
        self.samples.get(index as usize)
    }

    pub fn instrument(&self, index: u16) -> Option<&Instrument> {
        self.instruments.get(index as usize)
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn find_preset(&self, bank: u16, preset_id: u16) -> Option<&Preset> {
        self.presets.iter().find(|p| p.bank == bank && p.preset_id == preset_id)
    }
}

fn read_tag(cursor: &mut Cursor<&[u8]>) -> Result<[u8; 4], SoundFontError> {
    let mut tag = [0u8; 4];
    cursor.read_exact(&mut tag)?;
    Ok(tag)
}

fn achstring(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn parse(data: &[u8]) -> Result<SoundFont, SoundFontError> {
    let mut cursor = Cursor::new(data);

    if &read_tag(&mut cursor)? != b"RIFF" {
        return Err(SoundFontError::BadMagic);
    }
    let riff_size = cursor.read_u32::<LE>()?;
    let riff_end = cursor.position() as usize + riff_size as usize;
    if riff_end > data.len() {
        return Err(SoundFontError::Truncated);
    }
    if &read_tag(&mut cursor)? != b"sfbk" {
        return Err(SoundFontError::BadMagic);
    }

    let mut name = String::new();
    let mut sample_buffer = Vec::new();
    let mut pdta = None;

    while (cursor.position() as usize) < riff_end {
        let tag = read_tag(&mut cursor)?;
        let size = cursor.read_u32::<LE>()?;
        let body_start = cursor.position() as usize;
        let body_end = body_start + size as usize;
        if body_end > data.len() {
            return Err(SoundFontError::Truncated);
        }

        if &tag == b"LIST" {
            let list_type = read_tag(&mut cursor)?;
            let list_body = &data[cursor.position() as usize..body_end];
            match &list_type {
                b"INFO" => name = read_info_chunk(list_body)?,
                b"sdta" => sample_buffer = read_sdta_chunk(list_body)?,
                b"pdta" => pdta = Some(read_pdta_chunk(list_body)?),
                _ => {}
            }
        }

        let padded = size + (size & 1);
        cursor.set_position((body_start + padded as usize) as u64);
    }

    let pdta = pdta.ok_or(SoundFontError::MissingChunk("pdta"))?;
    let sample_buffer = Arc::new(sample_buffer);

    let samples = build_samples(&pdta, &sample_buffer)?;
    let instruments = build_instruments(&pdta)?;
    let presets = build_presets(&pdta)?;

    Ok(SoundFont { name, samples, instruments, presets })
}

fn read_info_chunk(body: &[u8]) -> Result<String, SoundFontError> {
    let mut cursor = Cursor::new(body);
    let mut name = String::new();
    while (cursor.position() as usize) < body.len() {
        let tag = read_tag(&mut cursor)?;
        let size = cursor.read_u32::<LE>()?;
        let start = cursor.position() as usize;
        let end = start + size as usize;
        if end > body.len() {
            return Err(SoundFontError::Truncated);
        }
        match &tag {
            b"ifil" => {
                let mut sub = Cursor::new(&body[start..end]);
                let major = sub.read_u16::<LE>()?;
                let minor = sub.read_u16::<LE>()?;
                if major > 2 || (major == 2 && minor > 4) {
                    return Err(SoundFontError::VersionTooNew { major, minor });
                }
            }
            b"INAM" => name = achstring(&body[start..end]),
            _ => {}
        }
        let padded = size + (size & 1);
        cursor.set_position((start + padded as usize) as u64);
    }
    Ok(name)
}

fn read_sdta_chunk(body: &[u8]) -> Result<Vec<i16>, SoundFontError> {
    let mut cursor = Cursor::new(body);
    let mut samples = Vec::new();
    while (cursor.position() as usize) < body.len() {
        let tag = read_tag(&mut cursor)?;
        let size = cursor.read_u32::<LE>()?;
        let start = cursor.position() as usize;
        let end = start + size as usize;
        if end > body.len() {
            return Err(SoundFontError::Truncated);
        }
        if &tag == b"smpl" {
            if size == 0 {
                return Err(SoundFontError::EmptySampleData);
            }
            let mut sub = Cursor::new(&body[start..end]);
            samples = Vec::with_capacity(size as usize / 2);
            for _ in 0..(size / 2) {
                samples.push(sub.read_i16::<LE>()?);
            }
        }
        let padded = size + (size & 1);
        cursor.set_position((start + padded as usize) as u64);
    }
    Ok(samples)
}

#[derive(Debug, Default)]
struct RawBag {
    gen_ndx: u16,
    mod_ndx: u16,
}

#[derive(Debug)]
struct RawModList {
    src: u16,
    dest_oper: u16,
    amount: i16,
    amt_src: u16,
    trans_oper: u16,
}

#[derive(Debug)]
struct RawGenList {
    oper: u16,
    lo: i8,
    hi: i8,
    amount: i16,
}

#[derive(Debug)]
struct RawPresetHeader {
    name: String,
    preset: u16,
    bank: u16,
    bag_ndx: u16,
}

#[derive(Debug)]
struct RawInst {
    name: String,
    bag_ndx: u16,
}

#[derive(Debug)]
struct RawShdr {
    name: String,
    start: u32,
    end: u32,
    start_loop: u32,
    end_loop: u32,
    sample_rate: u32,
    original_key: i8,
    correction: i8,
}

struct Pdta {
    phdr: Vec<RawPresetHeader>,
    pbag: Vec<RawBag>,
    pmod: Vec<RawModList>,
    pgen: Vec<RawGenList>,
    inst: Vec<RawInst>,
    ibag: Vec<RawBag>,
    imod: Vec<RawModList>,
    igen: Vec<RawGenList>,
    shdr: Vec<RawShdr>,
}

fn read_pdta_chunk(body: &[u8]) -> Result<Pdta, SoundFontError> {
    let mut phdr = Vec::new();
    let mut pbag = Vec::new();
    let mut pmod = Vec::new();
    let mut pgen = Vec::new();
    let mut inst = Vec::new();
    let mut ibag = Vec::new();
    let mut imod = Vec::new();
    let mut igen = Vec::new();
    let mut shdr = Vec::new();

    let mut cursor = Cursor::new(body);
    while (cursor.position() as usize) < body.len() {
        let tag = read_tag(&mut cursor)?;
        let size = cursor.read_u32::<LE>()?;
        let start = cursor.position() as usize;
        let end = start + size as usize;
        if end > body.len() {
            return Err(SoundFontError::Truncated);
        }
        let chunk = &body[start..end];
        match &tag {
            b"phdr" => phdr = read_records(chunk, 38, read_preset_header)?,
            b"pbag" => pbag = read_records(chunk, 4, read_bag)?,
            b"pmod" => pmod = read_records(chunk, 10, read_mod_list)?,
            b"pgen" => pgen = read_records(chunk, 4, read_gen_list)?,
            b"inst" => inst = read_records(chunk, 22, read_inst)?,
            b"ibag" => ibag = read_records(chunk, 4, read_bag)?,
            b"imod" => imod = read_records(chunk, 10, read_mod_list)?,
            b"igen" => igen = read_records(chunk, 4, read_gen_list)?,
            b"shdr" => shdr = read_records(chunk, 46, read_shdr)?,
            _ => {}
        }
        let padded = size + (size & 1);
        cursor.set_position((start + padded as usize) as u64);
    }

    Ok(Pdta { phdr, pbag, pmod, pgen, inst, ibag, imod, igen, shdr })
}

fn read_records<T>(
    chunk: &[u8],
    record_size: usize,
    parse_one: fn(&mut Cursor<&[u8]>) -> Result<T, SoundFontError>,
) -> Result<Vec<T>, SoundFontError> {
    if chunk.len() % record_size != 0 {
        return Err(SoundFontError::MalformedRecord("pdta sub-chunk size not a multiple of its record size"));
    }
    let mut cursor = Cursor::new(chunk);
    let mut out = Vec::with_capacity(chunk.len() / record_size);
    for _ in 0..(chunk.len() / record_size) {
        out.push(parse_one(&mut cursor)?);
    }
    Ok(out)
}

fn read_preset_header(c: &mut Cursor<&[u8]>) -> Result<RawPresetHeader, SoundFontError> {
    let mut name_buf = [0u8; 20];
    c.read_exact(&mut name_buf)?;
    let preset = c.read_u16::<LE>()?;
    let bank = c.read_u16::<LE>()?;
    let bag_ndx = c.read_u16::<LE>()?;
    c.read_u32::<LE>()?; // library
    c.read_u32::<LE>()?; // genre
    c.read_u32::<LE>()?; // morphology
    Ok(RawPresetHeader { name: achstring(&name_buf), preset, bank, bag_ndx })
}

fn read_bag(c: &mut Cursor<&[u8]>) -> Result<RawBag, SoundFontError> {
    Ok(RawBag { gen_ndx: c.read_u16::<LE>()?, mod_ndx: c.read_u16::<LE>()? })
}

fn read_mod_list(c: &mut Cursor<&[u8]>) -> Result<RawModList, SoundFontError> {
    let src = c.read_u16::<LE>()?;
    let dest_oper = c.read_u16::<LE>()?;
    let amount = c.read_i16::<LE>()?;
    let amt_src = c.read_u16::<LE>()?;
    let trans_oper = c.read_u16::<LE>()?;
    Ok(RawModList { src, dest_oper, amount, amt_src, trans_oper })
}

fn read_gen_list(c: &mut Cursor<&[u8]>) -> Result<RawGenList, SoundFontError> {
    let oper = c.read_u16::<LE>()?;
    let lo = c.read_u8()? as i8;
    let hi = c.read_u8()? as i8;
    // genAmount is a raw 16-bit union; reinterpret the same two bytes as a
    // signed amount for non-range generators.
    let amount = i16::from_le_bytes([lo as u8, hi as u8]);
    Ok(RawGenList { oper, lo, hi, amount })
}

fn read_inst(c: &mut Cursor<&[u8]>) -> Result<RawInst, SoundFontError> {
    let mut name_buf = [0u8; 20];
    c.read_exact(&mut name_buf)?;
    let bag_ndx = c.read_u16::<LE>()?;
    Ok(RawInst { name: achstring(&name_buf), bag_ndx })
}

fn read_shdr(c: &mut Cursor<&[u8]>) -> Result<RawShdr, SoundFontError> {
    let mut name_buf = [0u8; 20];
    c.read_exact(&mut name_buf)?;
    let start = c.read_u32::<LE>()?;
    let end = c.read_u32::<LE>()?;
    let start_loop = c.read_u32::<LE>()?;
    let end_loop = c.read_u32::<LE>()?;
    let sample_rate = c.read_u32::<LE>()?;
    let original_key = c.read_u8()? as i8;
    let correction = c.read_u8()? as i8;
    c.read_u16::<LE>()?; // sampleLink
    c.read_u16::<LE>()?; // sampleType
    Ok(RawShdr { name: achstring(&name_buf), start, end, start_loop, end_loop, sample_rate, original_key, correction })
}

fn general_controller(index: u16) -> GeneralController {
    match index {
        0 => GeneralController::NoController,
        2 => GeneralController::NoteOnVelocity,
        3 => GeneralController::NoteOnKeyNumber,
        10 => GeneralController::PolyPressure,
        13 => GeneralController::ChannelPressure,
        14 => GeneralController::PitchWheel,
        16 => GeneralController::PitchWheelSensitivity,
        _ => GeneralController::NoController,
    }
}

fn decode_mod_spec(raw: u16) -> ModSpec {
    let index = raw & 0x7f;
    let palette = (raw >> 7) & 1;
    let direction = if (raw >> 8) & 1 == 1 { SourceDirection::Negative } else { SourceDirection::Positive };
    let polarity = if (raw >> 9) & 1 == 1 { SourcePolarity::Bipolar } else { SourcePolarity::Unipolar };
    let kind = match (raw >> 10) & 0x3f {
        1 => SourceType::Concave,
        2 => SourceType::Convex,
        3 => SourceType::Switch,
        _ => SourceType::Linear,
    };
    if palette == 1 {
        ModSpec::midi(index as u8, direction, polarity, kind)
    } else {
        ModSpec::general(general_controller(index), direction, polarity, kind)
    }
}

fn decode_mod_param(raw: &RawModList) -> Option<ModParam> {
    let destination = Generator::from_raw(raw.dest_oper)?;
    let transform = if raw.trans_oper == 2 {
        super::modulator::Transform::AbsoluteValue
    } else {
        super::modulator::Transform::Linear
    };
    Some(ModParam {
        source: decode_mod_spec(raw.src),
        destination,
        amount: raw.amount,
        amount_source: decode_mod_spec(raw.amt_src),
        transform,
    })
}

/// Builds the zones covered by bag range `[bag_begin, bag_end)`, folding a
/// global zone (if the first bag in range doesn't end with `marker`) into
/// every real zone's generators and modulators.
fn build_zones(
    bag_begin: usize,
    bag_end: usize,
    bags: &[RawBag],
    gens: &[RawGenList],
    mods: &[RawModList],
    marker: Generator,
) -> Result<Vec<Zone>, SoundFontError> {
    let mut zones = Vec::new();
    let mut global: Option<Zone> = None;

    for bag_idx in bag_begin..bag_end {
        let next = bags.get(bag_idx + 1).ok_or(SoundFontError::BagIndexOutOfRange)?;
        let cur = &bags[bag_idx];
        if next.gen_ndx < cur.gen_ndx || next.mod_ndx < cur.mod_ndx {
            return Err(SoundFontError::NonMonotonicBag);
        }

        let gen_slice = gens
            .get(cur.gen_ndx as usize..next.gen_ndx as usize)
            .ok_or(SoundFontError::BagIndexOutOfRange)?;
        let mod_slice = mods
            .get(cur.mod_ndx as usize..next.mod_ndx as usize)
            .ok_or(SoundFontError::BagIndexOutOfRange)?;

        let mut zone = Zone::default();
        let mut ends_with_marker = false;
        for g in gen_slice {
            ends_with_marker = false;
            match g.oper {
                43 => zone.key_range = Range { min: g.lo, max: g.hi },
                44 => zone.velocity_range = Range { min: g.lo, max: g.hi },
                raw => {
                    if let Some(generator) = Generator::from_raw(raw) {
                        zone.generators.set(generator, g.amount);
                        if raw == marker as u16 {
                            ends_with_marker = true;
                        }
                    }
                }
            }
        }
        for m in mod_slice {
            if let Some(param) = decode_mod_param(m) {
                zone.modulator_parameters.append(param);
            }
        }

        let has_content = !gen_slice.is_empty() || !mod_slice.is_empty();
        if ends_with_marker {
            zones.push(zone);
        } else if bag_idx == bag_begin && has_content {
            global = Some(zone);
        } else if has_content {
            return Err(SoundFontError::ZoneMissingTerminator);
        }
    }

    if let Some(global) = global {
        for zone in &mut zones {
            zone.generators.merge(&global.generators);
            zone.modulator_parameters.merge(&global.modulator_parameters);
        }
    }

    Ok(zones)
}

fn build_samples(pdta: &Pdta, buffer: &Arc<Vec<i16>>) -> Result<Vec<Arc<Sample>>, SoundFontError> {
    if pdta.shdr.len() < 2 {
        return Err(SoundFontError::MalformedRecord("shdr needs at least one sample plus its terminal record"));
    }
    Ok(pdta.shdr[..pdta.shdr.len() - 1]
        .iter()
        .map(|s| {
            Arc::new(Sample::new(
                s.name.clone(),
                s.start,
                s.end,
                s.start_loop,
                s.end_loop,
                s.sample_rate,
                s.original_key,
                s.correction,
                buffer.clone(),
            ))
        })
        .collect())
}

fn build_instruments(pdta: &Pdta) -> Result<Vec<Instrument>, SoundFontError> {
    if pdta.inst.len() < 2 {
        return Err(SoundFontError::MalformedRecord("inst needs at least one instrument plus its terminal record"));
    }
    let mut instruments = Vec::with_capacity(pdta.inst.len() - 1);
    for i in 0..pdta.inst.len() - 1 {
        let begin = pdta.inst[i].bag_ndx as usize;
        let end = pdta.inst[i + 1].bag_ndx as usize;
        let zones = build_zones(begin, end, &pdta.ibag, &pdta.igen, &pdta.imod, Generator::SampleID)?;
        instruments.push(Instrument { name: pdta.inst[i].name.clone(), zones });
    }
    Ok(instruments)
}

fn build_presets(pdta: &Pdta) -> Result<Vec<Preset>, SoundFontError> {
    if pdta.phdr.len() < 2 {
        return Err(SoundFontError::MalformedRecord("phdr needs at least one preset plus its terminal record"));
    }
    let mut presets = Vec::with_capacity(pdta.phdr.len() - 1);
    for i in 0..pdta.phdr.len() - 1 {
        let begin = pdta.phdr[i].bag_ndx as usize;
        let end = pdta.phdr[i + 1].bag_ndx as usize;
        let zones = build_zones(begin, end, &pdta.pbag, &pdta.pgen, &pdta.pmod, Generator::Instrument)?;
        presets.push(Preset { name: pdta.phdr[i].name.clone(), bank: pdta.phdr[i].bank, preset_id: pdta.phdr[i].preset, zones });
    }
    Ok(presets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(tag);
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        if body.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn list(list_type: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut full = Vec::new();
        full.extend_from_slice(list_type);
        full.extend_from_slice(body);
        chunk(b"LIST", &full)
    }

    fn name20(name: &str) -> [u8; 20] {
        let mut buf = [0u8; 20];
        let bytes = name.as_bytes();
        buf[..bytes.len()].copy_from_slice(bytes);
        buf
    }

    /// Builds the smallest possible well-formed soundfont: one sample, one
    /// instrument with a single zone pointing at it, one preset with a
    /// single zone pointing at the instrument.
    fn build_minimal_sf2() -> Vec<u8> {
        let mut info_body = Vec::new();
        info_body.extend(chunk(b"ifil", &[2, 0, 0, 0])); // major 2, minor 0
        info_body.extend(chunk(b"INAM", b"test bank\0"));
        let info = list(b"INFO", &info_body);

        let samples: Vec<i16> = (0..100).map(|i| (i * 100) as i16).collect();
        let mut smpl = Vec::new();
        for s in &samples {
            smpl.extend_from_slice(&s.to_le_bytes());
        }
        let sdta = list(b"sdta", &chunk(b"smpl", &smpl));

        let mut phdr = Vec::new();
        phdr.extend_from_slice(&name20("Test Preset"));
        phdr.extend_from_slice(&0u16.to_le_bytes()); // preset
        phdr.extend_from_slice(&0u16.to_le_bytes()); // bank
        phdr.extend_from_slice(&0u16.to_le_bytes()); // bag_ndx
        phdr.extend_from_slice(&0u32.to_le_bytes());
        phdr.extend_from_slice(&0u32.to_le_bytes());
        phdr.extend_from_slice(&0u32.to_le_bytes());
        // terminal record
        phdr.extend_from_slice(&name20("EOP"));
        phdr.extend_from_slice(&0u16.to_le_bytes());
        phdr.extend_from_slice(&0u16.to_le_bytes());
        phdr.extend_from_slice(&1u16.to_le_bytes()); // bag_ndx = 1
        phdr.extend_from_slice(&0u32.to_le_bytes());
        phdr.extend_from_slice(&0u32.to_le_bytes());
        phdr.extend_from_slice(&0u32.to_le_bytes());

        let mut pbag = Vec::new();
        pbag.extend_from_slice(&0u16.to_le_bytes()); // gen_ndx
        pbag.extend_from_slice(&0u16.to_le_bytes()); // mod_ndx
        pbag.extend_from_slice(&1u16.to_le_bytes()); // terminal gen_ndx
        pbag.extend_from_slice(&0u16.to_le_bytes());

        let mut pgen = Vec::new();
        pgen.extend_from_slice(&(Generator::Instrument as u16).to_le_bytes());
        pgen.extend_from_slice(&0i16.to_le_bytes()); // instrument 0

        let mut inst = Vec::new();
        inst.extend_from_slice(&name20("Test Inst"));
        inst.extend_from_slice(&0u16.to_le_bytes());
        inst.extend_from_slice(&name20("EOI"));
        inst.extend_from_slice(&1u16.to_le_bytes());

        let mut ibag = Vec::new();
        ibag.extend_from_slice(&0u16.to_le_bytes());
        ibag.extend_from_slice(&0u16.to_le_bytes());
        ibag.extend_from_slice(&1u16.to_le_bytes());
        ibag.extend_from_slice(&0u16.to_le_bytes());

        let mut igen = Vec::new();
        igen.extend_from_slice(&(Generator::SampleID as u16).to_le_bytes());
        igen.extend_from_slice(&0i16.to_le_bytes()); // sample 0

        let mut shdr = Vec::new();
        shdr.extend_from_slice(&name20("Test Sample"));
        shdr.extend_from_slice(&0u32.to_le_bytes()); // start
        shdr.extend_from_slice(&100u32.to_le_bytes()); // end
        shdr.extend_from_slice(&0u32.to_le_bytes()); // startloop
        shdr.extend_from_slice(&99u32.to_le_bytes()); // endloop
        shdr.extend_from_slice(&44100u32.to_le_bytes());
        shdr.push(60); // original key
        shdr.push(0); // correction
        shdr.extend_from_slice(&0u16.to_le_bytes()); // sampleLink
        shdr.extend_from_slice(&1u16.to_le_bytes()); // sampleType (mono)
        shdr.extend_from_slice(&name20("EOS"));
        shdr.extend_from_slice(&[0u8; 26]);

        let mut pdta_body = Vec::new();
        pdta_body.extend(chunk(b"phdr", &phdr));
        pdta_body.extend(chunk(b"pbag", &pbag));
        pdta_body.extend(chunk(b"pmod", &[]));
        pdta_body.extend(chunk(b"pgen", &pgen));
        pdta_body.extend(chunk(b"inst", &inst));
        pdta_body.extend(chunk(b"ibag", &ibag));
        pdta_body.extend(chunk(b"imod", &[]));
        pdta_body.extend(chunk(b"igen", &igen));
        pdta_body.extend(chunk(b"shdr", &shdr));
        let pdta = list(b"pdta", &pdta_body);

        let mut sfbk_body = Vec::new();
        sfbk_body.extend_from_slice(b"sfbk");
        sfbk_body.extend(info);
        sfbk_body.extend(sdta);
        sfbk_body.extend(pdta);

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(sfbk_body.len() as u32).to_le_bytes());
        out.extend(sfbk_body);
        out
    }

    #[test]
    fn loads_name_samples_instruments_and_presets() {
        let data = build_minimal_sf2();
        let sf = parse(&data).expect("minimal soundfont should parse");
        assert_eq!(sf.name, "test bank");
        assert_eq!(sf.samples().len(), 1);
        assert_eq!(sf.presets().len(), 1);
        assert_eq!(sf.instrument(0).unwrap().zones.len(), 1);

        let preset = sf.find_preset(0, 0).expect("preset (0,0) should exist");
        assert_eq!(preset.zones.len(), 1);
        assert_eq!(preset.zones[0].instrument_index(), Some(0));

        let inst_zone = &sf.instrument(0).unwrap().zones[0];
        assert_eq!(inst_zone.sample_index(), Some(0));
    }

    #[test]
    fn rejects_a_version_newer_than_2_04() {
        let mut data = build_minimal_sf2();
        // ifil body starts right after "RIFF"+size(4)+"sfbk"+"LIST"+size(4)+"INFO"+"ifil"+size(4)
        let ifil_major_offset = data.windows(4).position(|w| w == b"ifil").unwrap() + 4 + 4;
        data[ifil_major_offset] = 3; // major = 3
        let err = parse(&data).unwrap_err();
        assert!(matches!(err, SoundFontError::VersionTooNew { major: 3, .. }));
    }

    #[test]
    fn rejects_bad_riff_magic() {
        let mut data = build_minimal_sf2();
        data[0] = b'X';
        assert!(matches!(parse(&data), Err(SoundFontError::BadMagic)));
    }
}
