//! Exportación a PDF con LibreOffice en modo headless.

use crate::error::{NotadorError, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Primitiva "renderizar a PDF": convierte el documento nativo `origen` y deja
/// el resultado en `destino`.
pub trait ConvertidorPdf {
    fn convertir(&self, origen: &Path, destino: &Path) -> Result<()>;
}

/// Conversión mediante `soffice --headless --convert-to pdf`.
///
/// Cada conversión usa un perfil de usuario propio en un directorio temporal,
/// de modo que varias conversiones pueden correr a la vez, y se espera como
/// máximo `espera_maxima`; pasado ese tiempo el proceso se mata.
#[derive(Debug, Clone)]
pub struct LibreOffice {
    pub ejecutable: PathBuf,
    pub espera_maxima: Duration,
}

impl LibreOffice {
    pub fn new(ejecutable: impl Into<PathBuf>, espera_maxima: Duration) -> Self {
        LibreOffice { ejecutable: ejecutable.into(), espera_maxima }
    }
}

const INTERVALO_SONDEO: Duration = Duration::from_millis(100);

/// Mata el proceso y lo recoge. Los errores se ignoran: el proceso puede
/// haber terminado ya.
fn detener(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Espera a que el proceso termine como mucho `espera_maxima`. En cualquier
/// salida con error el proceso queda muerto y recogido.
fn esperar(child: &mut Child, espera_maxima: Duration) -> Result<ExitStatus> {
    let inicio = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(estado)) => return Ok(estado),
            Ok(None) if inicio.elapsed() >= espera_maxima => {
                detener(child);
                return Err(NotadorError::Motor(format!(
                    "La conversión a PDF superó {} s",
                    espera_maxima.as_secs()
                )));
            }
            Ok(None) => thread::sleep(INTERVALO_SONDEO),
            Err(e) => {
                detener(child);
                return Err(e.into());
            }
        }
    }
}

impl ConvertidorPdf for LibreOffice {
    fn convertir(&self, origen: &Path, destino: &Path) -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let perfil = temp_dir.path().join("perfil");
        let salida = temp_dir.path().join("salida");
        std::fs::create_dir_all(&salida)?;

        let mut child = Command::new(&self.ejecutable)
            .arg(format!("-env:UserInstallation=file://{}", perfil.display()))
            .args(["--headless", "--norestore", "--convert-to", "pdf", "--outdir"])
            .arg(&salida)
            .arg(origen)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                NotadorError::Motor(format!(
                    "No se pudo ejecutar LibreOffice ({}): {}",
                    self.ejecutable.display(),
                    e
                ))
            })?;

        let inicio = Instant::now();
        let estado = esperar(&mut child, self.espera_maxima)?;
        if !estado.success() {
            return Err(NotadorError::Motor(format!("LibreOffice terminó con {}", estado)));
        }

        let nombre_pdf = origen
            .file_stem()
            .map(|s| format!("{}.pdf", s.to_string_lossy()))
            .ok_or_else(|| NotadorError::Motor(format!("Ruta sin nombre: {}", origen.display())))?;
        let generado = salida.join(nombre_pdf);
        if !generado.exists() {
            return Err(NotadorError::Motor(format!("No se generó el PDF en {}", generado.display())));
        }
        std::fs::copy(&generado, destino)?;
        tracing::debug!("📄 PDF exportado a {} en {:?}", destino.display(), inicio.elapsed());
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn proceso_que_no_termina_se_mata_y_se_recoge() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let inicio = Instant::now();
        let err = esperar(&mut child, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, NotadorError::Motor(_)));
        assert!(inicio.elapsed() < Duration::from_secs(10));
        // ya recogido: no queda nada pendiente
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn proceso_que_termina_devuelve_su_estado() {
        let mut child = Command::new("true").spawn().unwrap();
        let estado = esperar(&mut child, Duration::from_secs(10)).unwrap();
        assert!(estado.success());
    }
}
