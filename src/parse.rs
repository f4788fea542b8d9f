use scraper::ElementRef;
use url::Url;

use crate::document::{cells, create_selector, own_text, text, HtmlDocument};
use crate::models::{GradeEntry, ScheduleEntry, StudentProfile, Transcript, TranscriptEntry, ABSENT};
use crate::{Error, Result};

/// Every piece of portal markup the extractors depend on.
/// When SAES changes a page, this is the only place that should need an update.
pub(crate) mod selectors {
    use super::Column;

    // -- Login page
    pub(crate) const CAPTCHA_IMAGE: &str = "c_default_ctl00_leftcolumn_loginuser_logincaptcha_CaptchaImage";
    pub(crate) const LOGOUT_CONTROL: &str = "ctl00_leftColumn_LogOut";
    pub(crate) const LOGIN_ERROR: &str = "#ctl00_leftColumn_LoginUser > tbody > tr > td > span";

    // -- Navigation menu
    pub(crate) const NAV_SCHEDULE: &str = "td > table > tbody > tr > td > a";
    pub(crate) const NAV_MENU: &str = "table > tbody > tr > td > a";

    // -- Profile, served by the kardex page
    pub(crate) const PROFILE_BANNER: &str = "#banner";
    pub(crate) const PROFILE_ID: &str = "#ctl00_mainCopy_Lbl_Nombre > table > tbody > tr:nth-child(1) > td:nth-child(2)";
    pub(crate) const PROFILE_NAME: &str = "#ctl00_mainCopy_Lbl_Nombre > table > tbody > tr:nth-child(2) > td:nth-child(2)";
    pub(crate) const PROFILE_PROGRAM: &str = "#ctl00_mainCopy_Lbl_Carrera";
    pub(crate) const PROFILE_PLAN: &str = "#ctl00_mainCopy_Lbl_Plan";
    pub(crate) const PROFILE_GPA: &str = "#ctl00_mainCopy_Lbl_Promedio";

    // -- Schedule
    pub(crate) const SCHEDULE_ROWS: &str = "#ctl00_mainCopy_GV_Horario > tbody > tr:nth-child(n+2)";
    pub(crate) const SCHEDULE_GROUP: Column = Column::new(0, "schedule group");
    pub(crate) const SCHEDULE_SUBJECT: Column = Column::new(1, "schedule subject");
    pub(crate) const SCHEDULE_PROFESSOR: Column = Column::new(2, "schedule professor");
    pub(crate) const SCHEDULE_WEEKDAYS: [Column; 5] = [
        Column::new(3, "schedule monday"),
        Column::new(4, "schedule tuesday"),
        Column::new(5, "schedule wednesday"),
        Column::new(6, "schedule thursday"),
        Column::new(7, "schedule friday"),
    ];

    // -- Grades
    pub(crate) const GRADE_ROWS: &str = "#ctl00_mainCopy_GV_Calif > tbody > tr:nth-child(n+2)";
    pub(crate) const GRADE_GROUP: Column = Column::new(0, "grade group");
    pub(crate) const GRADE_SUBJECT: Column = Column::new(1, "grade subject");
    pub(crate) const GRADE_FIRST: Column = Column::new(2, "first partial");
    pub(crate) const GRADE_SECOND: Column = Column::new(3, "second partial");
    pub(crate) const GRADE_THIRD: Column = Column::new(4, "third partial");
    pub(crate) const GRADE_EXTRA: Column = Column::new(5, "extra");
    pub(crate) const GRADE_FINAL: Column = Column::new(6, "final grade");

    // -- Kardex
    pub(crate) const KARDEX: &str = "#ctl00_mainCopy_Lbl_Kardex";
    pub(crate) const KARDEX_LEVEL: &str = "center";
    pub(crate) const KARDEX_TABLE: &str = "table";
    /// Rows before this one hold the level label and the column headers.
    pub(crate) const KARDEX_FIRST_CLASS_ROW: usize = 2;
    pub(crate) const KARDEX_CODE: Column = Column::new(0, "kardex code");
    pub(crate) const KARDEX_SUBJECT: Column = Column::new(1, "kardex subject");
    pub(crate) const KARDEX_DATE: Column = Column::new(2, "kardex date");
    pub(crate) const KARDEX_TERM: Column = Column::new(3, "kardex term");
    pub(crate) const KARDEX_EVALUATION: Column = Column::new(4, "kardex evaluation type");
    pub(crate) const KARDEX_GRADE: Column = Column::new(5, "kardex grade");
}

/// A table column, by position among the row's cells.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Column {
    index: usize,
    name: &'static str,
}

impl Column {
    const fn new(index: usize, name: &'static str) -> Self {
        Self { index, name }
    }

    fn cell<'a>(&self, cells: &[ElementRef<'a>]) -> Result<ElementRef<'a>> {
        cells
            .get(self.index)
            .copied()
            .ok_or_else(|| Error::MalformedPage(format!("{} cell", self.name)))
    }

    fn text(&self, cells: &[ElementRef<'_>]) -> Result<String> {
        self.cell(cells).map(text)
    }

    fn own_text(&self, cells: &[ElementRef<'_>]) -> Result<String> {
        self.cell(cells).map(own_text)
    }
}

/// Portal pages reachable from the navigation menu of the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavLink {
    Schedule,
    Kardex,
    Grades,
}

impl NavLink {
    /// Text of the menu entry.
    pub fn label(self) -> &'static str {
        match self {
            NavLink::Schedule => "Horario",
            NavLink::Kardex => "Kárdex",
            NavLink::Grades => "Calificaciones",
        }
    }

    fn selector(self) -> &'static str {
        match self {
            NavLink::Schedule => selectors::NAV_SCHEDULE,
            NavLink::Kardex | NavLink::Grades => selectors::NAV_MENU,
        }
    }

    /// Whether an HTTP error page may still carry the data.
    pub(crate) fn tolerates_error_status(self) -> bool {
        matches!(self, NavLink::Grades)
    }
}

/// Absolute url of a menu entry in the landing page.
pub(crate) fn nav_link(working: &HtmlDocument, link: NavLink) -> Result<Url> {
    let label = link.label().to_lowercase();
    working
        .select_all(link.selector())?
        .into_iter()
        .find(|a| text(*a).to_lowercase().contains(&label))
        .and_then(|a| working.abs_url(a, "href"))
        .ok_or(Error::NavigationLinkNotFound(link.label()))
}

/// Upper-cases the first letter and lower-cases the rest.
/// ```
/// assert_eq!(saes::capitalize("SEGURIDAD DE REDES"), "Seguridad de redes");
/// ```
pub fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reads the student's general data from the kardex page.
pub(crate) fn student_profile(doc: &HtmlDocument) -> Result<StudentProfile> {
    Ok(StudentProfile::new(
        doc.text_of(selectors::PROFILE_BANNER)?,
        doc.text_of(selectors::PROFILE_ID)?,
        doc.text_of(selectors::PROFILE_NAME)?,
        doc.text_of(selectors::PROFILE_PROGRAM)?,
        doc.text_of(selectors::PROFILE_PLAN)?,
        doc.text_of(selectors::PROFILE_GPA)?,
    ))
}

pub(crate) fn schedule(doc: &HtmlDocument) -> Result<Vec<ScheduleEntry>> {
    use selectors::*;

    let rows = doc.select_all(SCHEDULE_ROWS)?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let cells = cells(row);
        let [mon, tue, wed, thu, fri] = SCHEDULE_WEEKDAYS;
        entries.push(ScheduleEntry {
            group_code: SCHEDULE_GROUP.text(&cells)?,
            subject_name: capitalize(&SCHEDULE_SUBJECT.text(&cells)?),
            professor_name: SCHEDULE_PROFESSOR.text(&cells)?,
            // No longer shown by the portal.
            building: ABSENT.to_string(),
            room: ABSENT.to_string(),
            weekday_slots: [
                mon.text(&cells)?,
                tue.text(&cells)?,
                wed.text(&cells)?,
                thu.text(&cells)?,
                fri.text(&cells)?,
            ],
        });
    }
    Ok(entries)
}

/// Grades of the current term. A term without posted grades yields an empty list.
pub(crate) fn grades(doc: &HtmlDocument) -> Result<Vec<GradeEntry>> {
    use selectors::*;

    let rows = doc.select_all(GRADE_ROWS)?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let cells = cells(row);
        entries.push(GradeEntry {
            group_code: GRADE_GROUP.text(&cells)?,
            subject_name: capitalize(&GRADE_SUBJECT.text(&cells)?),
            first_partial: GRADE_FIRST.text(&cells)?,
            second_partial: GRADE_SECOND.text(&cells)?,
            third_partial: GRADE_THIRD.text(&cells)?,
            extra: GRADE_EXTRA.text(&cells)?,
            final_grade: GRADE_FINAL.text(&cells)?,
        });
    }
    Ok(entries)
}

/// Walks the kardex, one `<center>` block per academic level.
/// Levels are numbered from 1 in the order the blocks appear, empty ones included.
pub(crate) fn transcript(doc: &HtmlDocument) -> Result<Transcript> {
    use selectors::*;

    let kardex = doc
        .select_first(KARDEX)?
        .ok_or_else(|| Error::MalformedPage(KARDEX.into()))?;
    let level_sel = create_selector(KARDEX_LEVEL)?;
    let table_sel = create_selector(KARDEX_TABLE)?;

    let mut transcript = Transcript::new();
    for (level_number, block) in (1u32..).zip(kardex.select(&level_sel)) {
        let table = block
            .select(&table_sel)
            .next()
            .ok_or_else(|| Error::MalformedPage(format!("table of kardex level {level_number}")))?;
        let rows = table_rows(table);

        let label = rows.first().map(|r| text(*r)).unwrap_or_default();
        transcript.add_level(level_number, if label.is_empty() { ABSENT.to_string() } else { label });

        for row in rows.iter().skip(KARDEX_FIRST_CLASS_ROW) {
            let cells = cells(*row);
            transcript.add_class(
                level_number,
                TranscriptEntry {
                    code: KARDEX_CODE.own_text(&cells)?,
                    subject_name: capitalize(&KARDEX_SUBJECT.own_text(&cells)?),
                    date: KARDEX_DATE.own_text(&cells)?,
                    term: KARDEX_TERM.own_text(&cells)?,
                    evaluation_type: KARDEX_EVALUATION.own_text(&cells)?,
                    grade: KARDEX_GRADE.own_text(&cells)?,
                },
            );
        }
    }
    Ok(transcript)
}

/// Rows of a table, looking through the `<tbody>` the parser inserts.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .flat_map(|child| match child.value().name() {
            "tr" => vec![child],
            "thead" | "tbody" | "tfoot" => child
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "tr")
                .collect(),
            _ => Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> HtmlDocument {
        let url = Url::parse("https://www.saes.escom.ipn.mx/alumnos/default.aspx").unwrap();
        HtmlDocument::parse(url, &format!("<html><body>{body}</body></html>"))
    }

    fn grade_row(cells: &[&str]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!("<tr>{tds}</tr>")
    }

    const GRADE_HEADER: &str = "<tr><th>Grupo</th><th>Materia</th><th>1er Parcial</th><th>2o Parcial</th><th>3er Parcial</th><th>Ext</th><th>Final</th></tr>";

    #[test]
    fn capitalize_normalizes_source_casing() {
        assert_eq!(capitalize("SEGURIDAD DE REDES"), "Seguridad de redes");
        assert_eq!(capitalize("álgebra LINEAL"), "Álgebra lineal");
        assert_eq!(capitalize("x"), "X");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn grades_reads_every_row() {
        let html = format!(
            r#"<table id="ctl00_mainCopy_GV_Calif">{GRADE_HEADER}{}{}</table>"#,
            grade_row(&["5AV81", "FORMULACION Y EVALUACION DE PROYECTOS", "9", "9", "9", "NP", "9"]),
            grade_row(&["5AV82", "SEGURIDAD DE REDES", "8", "-", "-", "-", "AC"]),
        );
        let grades = grades(&doc(&html)).unwrap();
        assert_eq!(grades.len(), 2);
        assert_eq!(
            grades[0],
            GradeEntry {
                group_code: "5AV81".into(),
                subject_name: "Formulacion y evaluacion de proyectos".into(),
                first_partial: "9".into(),
                second_partial: "9".into(),
                third_partial: "9".into(),
                extra: "NP".into(),
                final_grade: "9".into(),
            }
        );
        assert_eq!(grades[1].final_grade, "AC");
        assert_eq!(grades[1].second_partial, "-");
    }

    #[test]
    fn grades_without_rows_is_empty() {
        let only_header = format!(r#"<table id="ctl00_mainCopy_GV_Calif">{GRADE_HEADER}</table>"#);
        assert!(grades(&doc(&only_header)).unwrap().is_empty());
        assert!(grades(&doc("<p>Sin calificaciones</p>")).unwrap().is_empty());
    }

    #[test]
    fn grades_with_missing_cell_is_malformed() {
        let html = format!(
            r#"<table id="ctl00_mainCopy_GV_Calif">{GRADE_HEADER}{}</table>"#,
            grade_row(&["5AV81", "REDES", "9", "9", "9", "NP"]),
        );
        assert!(matches!(grades(&doc(&html)), Err(Error::MalformedPage(what)) if what.contains("final")));
    }

    #[test]
    fn schedule_reads_weekday_slots() {
        let html = r#"<table id="ctl00_mainCopy_GV_Horario">
            <tr><th>Grupo</th><th>Materia</th><th>Profesor</th><th>Lun</th><th>Mar</th><th>Mie</th><th>Jue</th><th>Vie</th></tr>
            <tr><td>3CM1</td><td>COMPILADORES</td><td>PEREZ LOPEZ JUAN</td><td>7:00 - 8:30</td><td>&nbsp;</td><td>7:00 - 8:30</td><td></td><td>10:30 - 12:00</td></tr>
        </table>"#;
        let schedule = schedule(&doc(html)).unwrap();
        assert_eq!(schedule.len(), 1);
        let class = &schedule[0];
        assert_eq!(class.group_code, "3CM1");
        assert_eq!(class.subject_name, "Compiladores");
        assert_eq!(class.professor_name, "PEREZ LOPEZ JUAN");
        assert_eq!(class.building, ABSENT);
        assert_eq!(class.weekday_slots, ["7:00 - 8:30", "", "7:00 - 8:30", "", "10:30 - 12:00"].map(String::from));
    }

    #[test]
    fn schedule_without_rows_is_empty() {
        let html = r#"<table id="ctl00_mainCopy_GV_Horario"><tr><th>Grupo</th></tr></table>"#;
        assert!(schedule(&doc(html)).unwrap().is_empty());
    }

    fn kardex_block(label: &str, classes: &[[&str; 6]]) -> String {
        let rows: String = classes
            .iter()
            .map(|c| format!("<tr>{}</tr>", c.iter().map(|v| format!("<td>{v}</td>")).collect::<String>()))
            .collect();
        format!(
            "<center><table><tr><td colspan=6>{label}</td></tr>\
             <tr><td>Clave</td><td>Materia</td><td>Fecha</td><td>Periodo</td><td>Forma Eval</td><td>Calif</td></tr>\
             {rows}</table></center>"
        )
    }

    #[test]
    fn transcript_groups_classes_by_level_block() {
        let html = format!(
            r#"<span id="ctl00_mainCopy_Lbl_Kardex">{}{}{}</span>"#,
            kardex_block(
                "PRIMER NIVEL",
                &[
                    ["C101", "CALCULO", "15/01/2019", "19/1", "ORD", "8"],
                    ["C102", "FISICA", "15/01/2019", "19/1", "ORD", "9"],
                ]
            ),
            kardex_block("SEGUNDO NIVEL", &[]),
            kardex_block(
                "TERCER NIVEL",
                &[
                    ["C301", "REDES", "15/01/2021", "21/1", "ORD", "10"],
                    ["C302", "SEGURIDAD DE REDES", "15/01/2021", "21/1", "ETS", "7"],
                    ["C303", "COMPILADORES", "15/06/2021", "21/2", "ORD", "8"],
                ]
            ),
        );
        let t = transcript(&doc(&html)).unwrap();
        assert_eq!(t.size(), 3);
        assert_eq!(t.level_classes(1).unwrap().len(), 2);
        assert!(t.level_classes(2).unwrap().is_empty());
        assert_eq!(t.level(2).unwrap().label, "SEGUNDO NIVEL");

        let third = t.level_classes(3).unwrap();
        let codes: Vec<_> = third.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["C301", "C302", "C303"]);
        assert_eq!(third[1].subject_name, "Seguridad de redes");
        assert_eq!(third[1].evaluation_type, "ETS");
        assert_eq!(third[1].grade, "7");
    }

    #[test]
    fn transcript_without_container_is_malformed() {
        assert!(matches!(transcript(&doc("<center></center>")), Err(Error::MalformedPage(_))));
    }

    #[test]
    fn profile_fills_missing_fields() {
        let html = r#"<div id="banner"> ESCUELA SUPERIOR DE COMPUTO </div>
            <span id="ctl00_mainCopy_Lbl_Nombre"><table>
                <tr><td>Boleta:</td><td>2019630001</td></tr>
                <tr><td>Nombre:</td><td>ANA GARCIA</td></tr>
            </table></span>
            <span id="ctl00_mainCopy_Lbl_Carrera">INGENIERIA EN SISTEMAS COMPUTACIONALES</span>
            <span id="ctl00_mainCopy_Lbl_Plan"></span>"#;
        let p = student_profile(&doc(html)).unwrap();
        assert_eq!(p.campus_banner, "ESCUELA SUPERIOR DE COMPUTO");
        assert_eq!(p.id_number, "2019630001");
        assert_eq!(p.full_name, "ANA GARCIA");
        assert_eq!(p.program_name, "INGENIERIA EN SISTEMAS COMPUTACIONALES");
        assert_eq!(p.study_plan, ABSENT);
        assert_eq!(p.gpa, ABSENT);
    }

    #[test]
    fn nav_link_matches_label_and_resolves_href() {
        let html = r#"<table><tr><td><table><tr><td>
                <a href="/Academica/horarios.aspx">Horario</a>
            </td></tr></table></td></tr></table>
            <table><tr><td><a href="../Alumnos/boleta/kardex.aspx">Kárdex</a></td></tr></table>"#;
        let d = doc(html);
        assert_eq!(
            nav_link(&d, NavLink::Schedule).unwrap().as_str(),
            "https://www.saes.escom.ipn.mx/Academica/horarios.aspx"
        );
        assert_eq!(
            nav_link(&d, NavLink::Kardex).unwrap().as_str(),
            "https://www.saes.escom.ipn.mx/Alumnos/boleta/kardex.aspx"
        );
        assert!(matches!(
            nav_link(&d, NavLink::Grades),
            Err(Error::NavigationLinkNotFound("Calificaciones"))
        ));
    }
}
