//! Plantillas DOCX: el `word/document.xml` se carga como un árbol XML pequeño
//! sobre el que se leen y escriben las celdas de las tablas de primer nivel.
//! El resto de entradas del paquete se copian tal cual al guardar.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::pdf::ConvertidorPdf;
use super::{DocumentoPlantilla, MotorDocumentos, PosicionCelda, SesionDocumento};
use crate::error::{NotadorError, Result};

const PARTE_DOCUMENTO: &str = "word/document.xml";

#[derive(Debug, Clone)]
enum Nodo {
    Elemento(Elemento),
    Texto(String),
    Otro(Event<'static>),
}

#[derive(Debug, Clone)]
struct Elemento {
    nombre: String,
    atributos: Vec<(String, String)>,
    hijos: Vec<Nodo>,
}

impl Elemento {
    fn new(nombre: impl Into<String>) -> Self {
        Elemento { nombre: nombre.into(), atributos: Vec::new(), hijos: Vec::new() }
    }

    /// Nombre sin prefijo de espacio de nombres (`w:tbl` → `tbl`).
    fn local(&self) -> &str {
        nombre_local(&self.nombre)
    }

    /// Prefijo con los dos puntos (`w:tc` → `w:`), para crear hermanos.
    fn prefijo(&self) -> &str {
        match self.nombre.find(':') {
            Some(i) => &self.nombre[..=i],
            None => "",
        }
    }

    fn hijos_locales<'a>(&'a self, local: &'static str) -> impl Iterator<Item = &'a Elemento> + 'a {
        self.hijos.iter().filter_map(move |n| match n {
            Nodo::Elemento(e) if e.local() == local => Some(e),
            _ => None,
        })
    }

    fn hijos_locales_mut<'a>(
        &'a mut self,
        local: &'static str,
    ) -> impl Iterator<Item = &'a mut Elemento> + 'a {
        self.hijos.iter_mut().filter_map(move |n| match n {
            Nodo::Elemento(e) if e.local() == local => Some(e),
            _ => None,
        })
    }
}

fn nombre_local(nombre: &str) -> &str {
    nombre.rsplit_once(':').map(|(_, l)| l).unwrap_or(nombre)
}

fn elemento_desde(inicio: &BytesStart) -> Result<Elemento> {
    let mut el = Elemento::new(String::from_utf8_lossy(inicio.name().as_ref()).into_owned());
    for attr in inicio.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let clave = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let valor = attr.unescape_value()?.into_owned();
        el.atributos.push((clave, valor));
    }
    Ok(el)
}

fn parsear_xml(xml: &str) -> Result<Vec<Nodo>> {
    let mut reader = Reader::from_str(xml);
    let mut pila: Vec<Elemento> = vec![Elemento::new("")];

    loop {
        let evento = reader.read_event()?;
        let nodo = match evento {
            Event::Start(e) => {
                pila.push(elemento_desde(&e)?);
                continue;
            }
            Event::End(_) => {
                let cerrado = pila.pop();
                match (cerrado, pila.last_mut()) {
                    (Some(el), Some(padre)) => padre.hijos.push(Nodo::Elemento(el)),
                    _ => return Err(NotadorError::Motor("XML con cierre sin apertura".into())),
                }
                continue;
            }
            Event::Empty(e) => Nodo::Elemento(elemento_desde(&e)?),
            Event::Text(t) => Nodo::Texto(t.unescape()?.into_owned()),
            Event::Eof => break,
            otro => Nodo::Otro(otro.into_owned()),
        };
        match pila.last_mut() {
            Some(actual) => actual.hijos.push(nodo),
            None => return Err(NotadorError::Motor("XML mal anidado".into())),
        }
    }

    match (pila.pop(), pila.is_empty()) {
        (Some(raiz), true) => Ok(raiz.hijos),
        _ => Err(NotadorError::Motor("XML con elementos sin cerrar".into())),
    }
}

fn escribir_nodos(writer: &mut Writer<Vec<u8>>, nodos: &[Nodo]) -> Result<()> {
    for nodo in nodos {
        match nodo {
            Nodo::Elemento(el) => {
                let mut inicio = BytesStart::new(el.nombre.as_str());
                for (k, v) in &el.atributos {
                    inicio.push_attribute((k.as_str(), v.as_str()));
                }
                if el.hijos.is_empty() {
                    writer.write_event(Event::Empty(inicio))?;
                } else {
                    writer.write_event(Event::Start(inicio))?;
                    escribir_nodos(writer, &el.hijos)?;
                    writer.write_event(Event::End(BytesEnd::new(el.nombre.as_str())))?;
                }
            }
            Nodo::Texto(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            Nodo::Otro(ev) => writer.write_event(ev.clone())?,
        }
    }
    Ok(())
}

fn serializar_xml(nodos: &[Nodo]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    escribir_nodos(&mut writer, nodos)?;
    Ok(writer.into_inner())
}

/// Tablas de primer nivel en orden de documento (no entra en tablas anidadas).
fn tablas<'a>(nodos: &'a [Nodo], salida: &mut Vec<&'a Elemento>) {
    for nodo in nodos {
        if let Nodo::Elemento(el) = nodo {
            if el.local() == "tbl" {
                salida.push(el);
            } else {
                tablas(&el.hijos, salida);
            }
        }
    }
}

fn tabla_mut<'a>(nodos: &'a mut [Nodo], objetivo: usize, vistas: &mut usize) -> Option<&'a mut Elemento> {
    for nodo in nodos.iter_mut() {
        if let Nodo::Elemento(el) = nodo {
            if el.local() == "tbl" {
                if *vistas == objetivo {
                    return Some(el);
                }
                *vistas += 1;
            } else if let Some(t) = tabla_mut(&mut el.hijos, objetivo, vistas) {
                return Some(t);
            }
        }
    }
    None
}

/// Texto de un párrafo: `w:t`, tabuladores y saltos de línea.
fn texto_parrafo(el: &Elemento, salida: &mut String) {
    for nodo in &el.hijos {
        if let Nodo::Elemento(hijo) = nodo {
            match hijo.local() {
                "t" => {
                    for n in &hijo.hijos {
                        if let Nodo::Texto(t) = n {
                            salida.push_str(t);
                        }
                    }
                }
                "tab" => salida.push('\t'),
                "br" | "cr" => salida.push('\n'),
                // propiedades y tablas anidadas no aportan texto
                "pPr" | "rPr" | "tbl" => {}
                _ => texto_parrafo(hijo, salida),
            }
        }
    }
}

/// Contenedores de bloque que pueden envolver los párrafos de una celda.
const ENVOLTORIOS: [&str; 3] = ["sdt", "sdtContent", "customXml"];

/// Párrafos de la celda en orden, incluidos los que están dentro de
/// controles de contenido. Las tablas anidadas no entran.
fn parrafos_celda<'a>(el: &'a Elemento, salida: &mut Vec<&'a Elemento>) {
    for nodo in &el.hijos {
        if let Nodo::Elemento(hijo) = nodo {
            match hijo.local() {
                "p" => salida.push(hijo),
                local if ENVOLTORIOS.contains(&local) => parrafos_celda(hijo, salida),
                _ => {}
            }
        }
    }
}

/// Primera ejecución del párrafo, aunque esté dentro de un control en línea.
fn primer_run(el: &Elemento) -> Option<&Elemento> {
    el.hijos.iter().find_map(|n| match n {
        Nodo::Elemento(hijo) if hijo.local() == "r" => Some(hijo),
        Nodo::Elemento(hijo) if hijo.local() != "pPr" => primer_run(hijo),
        _ => None,
    })
}

fn texto_celda(tc: &Elemento) -> String {
    let mut parrafos = Vec::new();
    parrafos_celda(tc, &mut parrafos);
    parrafos
        .into_iter()
        .map(|p| {
            let mut s = String::new();
            texto_parrafo(p, &mut s);
            s
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn hijo_local<'a>(el: &'a Elemento, local: &'static str) -> Option<&'a Elemento> {
    el.hijos_locales(local).next()
}

/// Sustituye el contenido de la celda por un único párrafo con `texto`.
/// Se conservan las propiedades de la celda y el formato del primer párrafo
/// (aunque esté dentro de un control de contenido) y de su primera ejecución.
fn escribir_texto_celda(tc: &mut Elemento, texto: &str) {
    let w = tc.prefijo().to_string();
    let tc_pr = hijo_local(tc, "tcPr").cloned();
    let mut parrafos = Vec::new();
    parrafos_celda(tc, &mut parrafos);
    let primer_p = parrafos.first().copied();
    let p_pr = primer_p.and_then(|p| hijo_local(p, "pPr")).cloned();
    let r_pr = primer_p.and_then(primer_run).and_then(|r| hijo_local(r, "rPr")).cloned();

    let mut run = Elemento::new(format!("{w}r"));
    if let Some(r_pr) = r_pr {
        run.hijos.push(Nodo::Elemento(r_pr));
    }
    for (i, linea) in texto.split('\n').enumerate() {
        if i > 0 {
            run.hijos.push(Nodo::Elemento(Elemento::new(format!("{w}br"))));
        }
        let mut t = Elemento::new(format!("{w}t"));
        t.atributos.push(("xml:space".to_string(), "preserve".to_string()));
        if !linea.is_empty() {
            t.hijos.push(Nodo::Texto(linea.to_string()));
        }
        run.hijos.push(Nodo::Elemento(t));
    }

    let mut parrafo = Elemento::new(format!("{w}p"));
    if let Some(p_pr) = p_pr {
        parrafo.hijos.push(Nodo::Elemento(p_pr));
    }
    parrafo.hijos.push(Nodo::Elemento(run));

    tc.hijos.clear();
    if let Some(tc_pr) = tc_pr {
        tc.hijos.push(Nodo::Elemento(tc_pr));
    }
    tc.hijos.push(Nodo::Elemento(parrafo));
}

fn parrafos_sueltos(nodos: &[Nodo], salida: &mut Vec<String>) {
    for nodo in nodos {
        if let Nodo::Elemento(el) = nodo {
            match el.local() {
                "tbl" => {}
                "p" => {
                    let mut s = String::new();
                    texto_parrafo(el, &mut s);
                    salida.push(s);
                }
                _ => parrafos_sueltos(&el.hijos, salida),
            }
        }
    }
}

/// Entrada del paquete: nombre y bytes sin descomprimir (directorios con `None`).
#[derive(Debug, Clone)]
struct EntradaZip {
    nombre: String,
    datos: Option<Vec<u8>>,
}

/// Documento DOCX en memoria.
#[derive(Debug, Clone)]
pub struct DocumentoDocx {
    entradas: Vec<EntradaZip>,
    cuerpo: Vec<Nodo>,
}

impl DocumentoDocx {
    pub fn abrir<P: AsRef<Path>>(ruta: P) -> Result<Self> {
        let ruta = ruta.as_ref();
        let file = File::open(ruta)?;
        let mut archive = ZipArchive::new(file)?;

        let mut entradas = Vec::with_capacity(archive.len());
        let mut cuerpo = None;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let nombre = entry.name().to_string();
            if entry.is_dir() {
                entradas.push(EntradaZip { nombre, datos: None });
                continue;
            }
            let mut datos = Vec::new();
            entry.read_to_end(&mut datos)?;
            if nombre == PARTE_DOCUMENTO {
                let xml = String::from_utf8(datos.clone()).map_err(|e| {
                    NotadorError::Motor(format!("{} no es UTF-8: {}", PARTE_DOCUMENTO, e))
                })?;
                cuerpo = Some(parsear_xml(xml.trim_start_matches('\u{feff}'))?);
            }
            entradas.push(EntradaZip { nombre, datos: Some(datos) });
        }

        let cuerpo = cuerpo.ok_or_else(|| {
            NotadorError::Motor(format!("{} no contiene {}", ruta.display(), PARTE_DOCUMENTO))
        })?;
        tracing::debug!("📖 Plantilla {} abierta ({} entradas)", ruta.display(), entradas.len());
        Ok(DocumentoDocx { entradas, cuerpo })
    }

    /// Escribe el paquete completo con el `document.xml` actual.
    pub fn guardar<P: AsRef<Path>>(&self, destino: P) -> Result<()> {
        let destino = destino.as_ref();
        let documento = serializar_xml(&self.cuerpo)?;
        let file = File::create(destino)?;
        let mut zip = ZipWriter::new(file);
        let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entrada in &self.entradas {
            match &entrada.datos {
                None => zip.add_directory(entrada.nombre.as_str(), opts)?,
                Some(datos) => {
                    zip.start_file(entrada.nombre.as_str(), opts)?;
                    if entrada.nombre == PARTE_DOCUMENTO {
                        zip.write_all(&documento)?;
                    } else {
                        zip.write_all(datos)?;
                    }
                }
            }
        }
        zip.finish()?;
        tracing::debug!("💾 Documento guardado en {}", destino.display());
        Ok(())
    }

    fn tablas(&self) -> Vec<&Elemento> {
        let mut salida = Vec::new();
        tablas(&self.cuerpo, &mut salida);
        salida
    }

    fn fila(&self, tabla: usize, fila: usize) -> Option<&Elemento> {
        self.tablas().into_iter().nth(tabla).and_then(|t| t.hijos_locales("tr").nth(fila))
    }
}

impl DocumentoPlantilla for DocumentoDocx {
    fn num_tablas(&self) -> usize {
        self.tablas().len()
    }

    fn num_filas(&self, tabla: usize) -> usize {
        self.tablas().into_iter().nth(tabla).map(|t| t.hijos_locales("tr").count()).unwrap_or(0)
    }

    fn num_celdas(&self, tabla: usize, fila: usize) -> usize {
        self.fila(tabla, fila).map(|f| f.hijos_locales("tc").count()).unwrap_or(0)
    }

    fn texto_celda(&self, pos: PosicionCelda) -> Option<String> {
        self.fila(pos.tabla, pos.fila)?.hijos_locales("tc").nth(pos.columna).map(texto_celda)
    }

    fn escribir_celda(&mut self, pos: PosicionCelda, texto: &str) -> bool {
        let mut vistas = 0;
        let Some(tabla) = tabla_mut(&mut self.cuerpo, pos.tabla, &mut vistas) else {
            return false;
        };
        let celda = tabla
            .hijos_locales_mut("tr")
            .nth(pos.fila)
            .and_then(|f| f.hijos_locales_mut("tc").nth(pos.columna));
        match celda {
            Some(tc) => {
                escribir_texto_celda(tc, texto);
                true
            }
            None => false,
        }
    }

    fn textos_parrafos(&self) -> Vec<String> {
        let mut salida = Vec::new();
        parrafos_sueltos(&self.cuerpo, &mut salida);
        salida
    }
}

/// Motor DOCX: cada `abrir` carga una copia propia de la plantilla.
#[derive(Debug, Clone)]
pub struct MotorDocx<C: ConvertidorPdf> {
    convertidor: C,
}

impl<C: ConvertidorPdf> MotorDocx<C> {
    pub fn new(convertidor: C) -> Self {
        MotorDocx { convertidor }
    }
}

impl<C: ConvertidorPdf> MotorDocumentos for MotorDocx<C> {
    fn abrir(&self, plantilla: &Path) -> Result<Box<dyn SesionDocumento + '_>> {
        let documento = DocumentoDocx::abrir(plantilla)?;
        Ok(Box::new(SesionDocx {
            documento,
            convertidor: &self.convertidor,
            guardado: None,
            temporal: None,
        }))
    }
}

struct SesionDocx<'a, C: ConvertidorPdf> {
    documento: DocumentoDocx,
    convertidor: &'a C,
    /// Última ruta donde se guardó el documento.
    guardado: Option<PathBuf>,
    temporal: Option<tempfile::TempDir>,
}

impl<C: ConvertidorPdf> SesionDocumento for SesionDocx<'_, C> {
    fn documento(&mut self) -> &mut dyn DocumentoPlantilla {
        &mut self.documento
    }

    fn guardar(&mut self, destino: &Path) -> Result<()> {
        self.documento.guardar(destino)?;
        self.guardado = Some(destino.to_path_buf());
        Ok(())
    }

    fn exportar_pdf(&mut self, destino: &Path) -> Result<()> {
        let origen = match &self.guardado {
            Some(ruta) => ruta.clone(),
            None => {
                let dir = tempfile::tempdir()?;
                let ruta = dir.path().join("boletin.docx");
                self.documento.guardar(&ruta)?;
                self.temporal = Some(dir);
                ruta
            }
        };
        self.convertidor.convertir(&origen, destino)
    }
}

impl<C: ConvertidorPdf> Drop for SesionDocx<'_, C> {
    fn drop(&mut self) {
        if let Some(dir) = self.temporal.take() {
            let ruta = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!("⚠️ No se pudo borrar {}: {}", ruta.display(), e);
            }
        }
        tracing::trace!("Sesión de documento liberada");
    }
}
