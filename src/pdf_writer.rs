//! Incremental-update serialization
//!
//! The stamper never rewrites the original document; it appends an update
//! section that replaces the page dictionaries and adds the footer content
//! streams, font and image objects. Offsets in the cross-reference table are
//! absolute within the final artifact, so the caller supplies the byte
//! position at which the section will be appended.

use lopdf::{Dictionary, Object, ObjectId};

/// Serializes one object body into `out` (without the `obj`/`endobj` frame).
pub fn serialize_object(out: &mut Vec<u8>, object: &Object) {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(value) => {
            out.extend_from_slice(if *value { b"true" } else { b"false" })
        }
        Object::Integer(value) => out.extend_from_slice(format!("{value}").as_bytes()),
        Object::Real(value) => out.extend_from_slice(format!("{value}").as_bytes()),
        Object::Name(name) => serialize_name(out, name),
        // Hex form sidesteps literal-string escaping for arbitrary bytes.
        Object::String(bytes, _) => {
            out.push(b'<');
            out.extend_from_slice(hex::encode(bytes).as_bytes());
            out.push(b'>');
        }
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                serialize_object(out, item);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => serialize_dictionary(out, dict),
        Object::Stream(stream) => {
            let mut dict = stream.dict.clone();
            dict.set("Length", Object::Integer(stream.content.len() as i64));
            serialize_dictionary(out, &dict);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(&stream.content);
            out.extend_from_slice(b"\nendstream");
        }
        Object::Reference((num, gen)) => {
            out.extend_from_slice(format!("{num} {gen} R").as_bytes())
        }
    }
}

fn serialize_dictionary(out: &mut Vec<u8>, dict: &Dictionary) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        out.push(b' ');
        serialize_name(out, key);
        out.push(b' ');
        serialize_object(out, value);
    }
    out.extend_from_slice(b" >>");
}

fn serialize_name(out: &mut Vec<u8>, name: &[u8]) {
    out.push(b'/');
    for &byte in name {
        if is_regular_name_byte(byte) {
            out.push(byte);
        } else {
            out.extend_from_slice(format!("#{byte:02X}").as_bytes());
        }
    }
}

fn is_regular_name_byte(byte: u8) -> bool {
    (0x21..=0x7e).contains(&byte) && !matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#')
}

/// Collects replacement and new objects and renders them as one update
/// section: object bodies, a classic cross-reference table, and a trailer
/// chaining back to the previous one via `/Prev`.
pub struct IncrementalUpdate {
    objects: Vec<(ObjectId, Object)>,
}

impl IncrementalUpdate {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    pub fn add(&mut self, id: ObjectId, object: Object) {
        self.objects.push((id, object));
    }

    /// Renders the section. `base_offset` is the byte position of the section
    /// within the final file; `size` is one past the highest object number in
    /// use; `prev_startxref` is the original document's startxref value.
    pub fn render(
        &self,
        base_offset: usize,
        root: ObjectId,
        prev_startxref: u64,
        size: u32,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        let mut entries: Vec<(u32, u16, usize)> = Vec::with_capacity(self.objects.len());

        for (id, object) in &self.objects {
            entries.push((id.0, id.1, base_offset + out.len()));
            out.extend_from_slice(format!("{} {} obj\n", id.0, id.1).as_bytes());
            serialize_object(&mut out, object);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = base_offset + out.len();
        entries.sort_unstable_by_key(|e| e.0);

        out.extend_from_slice(b"xref\n");
        out.extend_from_slice(b"0 1\n0000000000 65535 f \n");
        let mut i = 0;
        while i < entries.len() {
            let start = entries[i].0;
            let mut run = 1;
            while i + run < entries.len() && entries[i + run].0 == start + run as u32 {
                run += 1;
            }
            out.extend_from_slice(format!("{start} {run}\n").as_bytes());
            for (_, gen, offset) in &entries[i..i + run] {
                out.extend_from_slice(format!("{offset:010} {gen:05} n \n").as_bytes());
            }
            i += run;
        }

        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {size} /Root {} {} R /Prev {prev_startxref} >>\nstartxref\n{xref_offset}\n%%EOF\n",
                root.0, root.1
            )
            .as_bytes(),
        );
        out
    }
}

impl Default for IncrementalUpdate {
    fn default() -> Self {
        Self::new()
    }
}
