//! Every IPN campus with a SAES portal.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Campus {
    /// Short identifier, the subdomain of the campus portal.
    pub id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
}

const fn campus(id: &'static str, name: &'static str, url: &'static str) -> Campus {
    Campus { id, name, url }
}

static CAMPUSES: &[Campus] = &[
    campus("cet1", "CET 1", "https://www.saes.cet1.ipn.mx/"),
    campus("cecyt1", "CECyT 1", "https://www.saes.cecyt1.ipn.mx/"),
    campus("cecyt2", "CECyT 2", "https://www.saes.cecyt2.ipn.mx/"),
    campus("cecyt3", "CECyT 3", "https://www.saes.cecyt3.ipn.mx/"),
    campus("cecyt4", "CECyT 4", "https://www.saes.cecyt4.ipn.mx/"),
    campus("cecyt5", "CECyT 5", "https://www.saes.cecyt5.ipn.mx/"),
    campus("cecyt6", "CECyT 6", "https://www.saes.cecyt6.ipn.mx/"),
    campus("cecyt7", "CECyT 7", "https://www.saes.cecyt7.ipn.mx/"),
    campus("cecyt8", "CECyT 8", "https://www.saes.cecyt8.ipn.mx/"),
    campus("cecyt9", "CECyT 9", "https://www.saes.cecyt9.ipn.mx/"),
    campus("cecyt10", "CECyT 10", "https://www.saes.cecyt10.ipn.mx/"),
    campus("cecyt11", "CECyT 11", "https://www.saes.cecyt11.ipn.mx/"),
    campus("cecyt12", "CECyT 12", "https://www.saes.cecyt12.ipn.mx/"),
    campus("cecyt13", "CECyT 13", "https://www.saes.cecyt13.ipn.mx/"),
    campus("cecyt14", "CECyT 14", "https://www.saes.cecyt14.ipn.mx/"),
    campus("cecyt15", "CECyT 15", "https://www.saes.cecyt15.ipn.mx/"),
    campus("cecyt16", "CECyT 16", "https://www.saes.cecyt16.ipn.mx/"),
    campus("cecyt17", "CECyT 17", "https://www.saes.cecyt17.ipn.mx/"),
    campus("cecyt18", "CECyT 18", "https://www.saes.cecyt18.ipn.mx/"),
    campus("cecyt19", "CECyT 19", "https://www.saes.cecyt19.ipn.mx/"),
    campus("cicsma", "CICS Milpa Alta", "https://www.saes.cicsma.ipn.mx/"),
    campus("cicsst", "CICS Santo Tomás", "https://www.saes.cicsst.ipn.mx/"),
    campus("enba", "ENBA", "https://www.saes.enba.ipn.mx/"),
    campus("encb", "ENCB", "https://www.saes.encb.ipn.mx/"),
    campus("enmh", "ENMH", "https://www.saes.enmh.ipn.mx/"),
    campus("escasto", "ESCA Santo Tomás", "https://www.saes.escasto.ipn.mx/"),
    campus("escatep", "ESCA Tepepan", "https://www.saes.escatep.ipn.mx/"),
    campus("escom", "ESCOM", "https://www.saes.escom.ipn.mx/"),
    campus("ese", "ESE", "https://www.saes.ese.ipn.mx/"),
    campus("eseo", "ESEO", "https://www.saes.eseo.ipn.mx/"),
    campus("esfm", "ESFM", "https://www.saes.esfm.ipn.mx/"),
    campus("esiatec", "ESIA Tecamachalco", "https://www.saes.esiatec.ipn.mx/"),
    campus("esiatic", "ESIA Ticomán", "https://www.saes.esiatic.ipn.mx/"),
    campus("esiaz", "ESIA Zacatenco", "https://www.saes.esiaz.ipn.mx/"),
    campus("esimeazc", "ESIME Azcapotzalco", "https://www.saes.esimeazc.ipn.mx/"),
    campus("esimecu", "ESIME Culhuacan", "https://www.saes.esimecu.ipn.mx/"),
    campus("esimetic", "ESIME Ticomán", "https://www.saes.esimetic.ipn.mx/"),
    campus("esimez", "ESIME Zacatenco", "https://www.saes.esimez.ipn.mx/"),
    campus("esiqie", "ESIQIE", "https://www.saes.esiqie.ipn.mx/"),
    campus("esit", "ESIT", "https://www.saes.esit.ipn.mx/"),
    campus("esm", "ESM", "https://www.saes.esm.ipn.mx/"),
    campus("est", "EST", "https://www.saes.est.ipn.mx/"),
    campus("upibi", "UPIBI", "https://www.saes.upibi.ipn.mx/"),
    campus("upiem", "UPIEM", "https://www.saes.upiem.ipn.mx/"),
    campus("upiic", "UPIIC", "https://www.saes.upiic.ipn.mx/"),
    campus("upiicsa", "UPIICSA", "https://www.saes.upiicsa.ipn.mx/"),
    campus("upiig", "UPIIG", "https://www.saes.upiig.ipn.mx/"),
    campus("upiih", "UPIIH", "https://www.saes.upiih.ipn.mx/"),
    campus("upiip", "UPIIP", "https://www.saes.upiip.ipn.mx/"),
    campus("upiita", "UPIITA", "https://www.saes.upiita.ipn.mx/"),
    campus("upiiz", "UPIIZ", "https://www.saes.upiiz.ipn.mx/"),
];

pub fn campuses() -> &'static [Campus] {
    CAMPUSES
}

/// Looks a campus up by its id or display name, ignoring case.
pub fn find(campus_id: &str) -> Result<&'static Campus> {
    let wanted = campus_id.trim();
    CAMPUSES
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(wanted) || c.name.to_lowercase() == wanted.to_lowercase())
        .ok_or_else(|| Error::UnknownCampus(campus_id.into()))
}

/// Returns the base url of the campus portal.
pub fn resolve(campus_id: &str) -> Result<&'static str> {
    find(campus_id).map(|c| c.url)
}
