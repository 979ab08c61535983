// --- Generador de boletines - Archivo principal ---

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use notador::{filtrar_estudiantes, run_server, Configuracion, Notador, TablasMapeo};

#[derive(Parser)]
#[command(name = "notador", version, about = "Genera boletines académicos desde una planilla de notas")]
struct Cli {
    /// JSON con tablas de mapeo (sustituye a NOTADOR_TABLAS)
    #[arg(long, global = true)]
    tablas: Option<PathBuf>,

    /// Ejecutable de LibreOffice (sustituye a NOTADOR_SOFFICE)
    #[arg(long, global = true)]
    soffice: Option<PathBuf>,

    #[command(subcommand)]
    comando: Comando,
}

#[derive(Subcommand)]
enum Comando {
    /// Lista las hojas de grado de la planilla
    Grados {
        #[arg(long)]
        excel: PathBuf,
    },
    /// Lista los estudiantes de un grado
    Estudiantes {
        #[arg(long)]
        excel: PathBuf,
        #[arg(long)]
        grado: String,
        /// Filtra por ID, nombre o grupo
        #[arg(long)]
        buscar: Option<String>,
        /// Salida en JSON
        #[arg(long)]
        json: bool,
    },
    /// Genera boletines (.docx y .pdf)
    Generar {
        #[arg(long)]
        excel: PathBuf,
        #[arg(long)]
        plantilla: PathBuf,
        #[arg(long)]
        salida: PathBuf,
        /// Hoja del grado (obligatoria salvo con --todos)
        #[arg(long, required_unless_present = "todos")]
        grado: Option<String>,
        /// Solo este estudiante
        #[arg(long, conflicts_with = "todos")]
        id: Option<String>,
        /// Todas las hojas de grado
        #[arg(long)]
        todos: bool,
        #[arg(long)]
        grupo: Option<String>,
        #[arg(long)]
        periodo: Option<String>,
        /// Escribe el resumen del lote en JSON
        #[arg(long)]
        reporte: Option<PathBuf>,
    },
    /// Revisa el mapeo de áreas contra la planilla y la plantilla
    Revisar {
        #[arg(long)]
        excel: PathBuf,
        #[arg(long)]
        plantilla: PathBuf,
        #[arg(long)]
        grado: String,
    },
    /// Servidor HTTP
    Servir {
        /// Dirección (sustituye a NOTADOR_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
}

fn imprimir(mensaje: &str) {
    println!("{}", mensaje);
}

fn escribir_reporte<T: serde::Serialize>(ruta: &Path, valor: &T) -> Result<()> {
    let texto = serde_json::to_string_pretty(valor)?;
    std::fs::write(ruta, texto).with_context(|| format!("No se pudo escribir {}", ruta.display()))?;
    println!("📄 Reporte escrito en {}", ruta.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Configuracion::desde_entorno().context("Configuración inválida")?;
    if let Some(ruta) = &cli.tablas {
        config.tablas = TablasMapeo::cargar(ruta)?;
    }
    if let Some(soffice) = cli.soffice {
        config.soffice = soffice;
    }

    match cli.comando {
        Comando::Grados { excel } => {
            let mut notador = Notador::desde_configuracion(&config);
            notador.set_excel_file(&excel)?;
            for grado in notador.grados()? {
                println!("{}", grado);
            }
        }
        Comando::Estudiantes { excel, grado, buscar, json } => {
            let mut notador = Notador::desde_configuracion(&config);
            notador.set_excel_file(&excel)?;
            let lista = notador.estudiantes(&grado)?;
            let lista = filtrar_estudiantes(&lista, buscar.as_deref().unwrap_or(""));
            if json {
                println!("{}", serde_json::to_string_pretty(&lista)?);
            } else {
                for e in &lista {
                    println!("{}\t{}\t{}", e.id, e.nombre, e.grupo);
                }
            }
        }
        Comando::Generar { excel, plantilla, salida, grado, id, todos, grupo, periodo, reporte } => {
            let mut notador = Notador::desde_configuracion(&config);
            notador.set_excel_file(&excel)?;
            notador.set_word_template(&plantilla)?;
            notador.set_output_folder(&salida);
            let mut progreso = imprimir;

            if todos {
                let resumenes = notador.procesar_todos(periodo.as_deref(), Some(&mut progreso))?;
                let fallas: usize = resumenes.iter().map(|r| r.fallas.len()).sum();
                println!("=== {} grados procesados, {} fallos ===", resumenes.len(), fallas);
                if let Some(ruta) = reporte {
                    escribir_reporte(&ruta, &resumenes)?;
                }
            } else {
                let grado = grado.context("Falta --grado")?;
                match id {
                    Some(id) => {
                        let archivos = notador.procesar_estudiante(
                            &id,
                            &grado,
                            grupo.as_deref(),
                            periodo.as_deref(),
                            Some(&mut progreso),
                        )?;
                        println!("{}\n{}", archivos.documento.display(), archivos.pdf.display());
                    }
                    None => {
                        let resumen =
                            notador.procesar_grado(&grado, periodo.as_deref(), None, Some(&mut progreso))?;
                        println!(
                            "=== Grado {}: {} boletines, {} fallos ===",
                            resumen.grado,
                            resumen.generados.len(),
                            resumen.fallas.len()
                        );
                        if let Some(ruta) = reporte {
                            escribir_reporte(&ruta, &resumen)?;
                        }
                    }
                }
            }
        }
        Comando::Revisar { excel, plantilla, grado } => {
            let mut notador = Notador::desde_configuracion(&config);
            notador.set_excel_file(&excel)?;
            notador.set_word_template(&plantilla)?;
            let diag = notador.diagnosticar_areas(&grado)?;
            println!("{}", serde_json::to_string_pretty(&diag)?);
        }
        Comando::Servir { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            println!("=== Generador de boletines (API) ===");
            println!("Iniciando servidor en http://{}", bind);
            run_server(&bind, config).await?;
        }
    }
    Ok(())
}
