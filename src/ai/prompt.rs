//! Instruction prompt for the extraction model.

/// System message sent with the chat-completions request.
pub const SYSTEM_MESSAGE: &str = "You are a helpful JSON-only information extraction assistant.";

/// Keys every returned item must carry, in record order.
pub const OUTPUT_KEYS: &str = "nom, prenom, email, telephone, ville, villes (array), pays, \
date_debut (YYYY-MM-DD or ''), date_fin (YYYY-MM-DD or ''), type_vehicule, type_voyage, \
nb_personnes, infos_libres, corps_mail, langue_detectee, itinerary";

const RULES: [&str; 10] = [
    "ville: pick the single primary city of service (the city where the customer wants to \
     rent the vehicle). Do not return venues or landmarks.",
    "villes: include the other mentioned cities, but no venues or addresses.",
    "pays: deduce it from the primary city (Paris->France, London->United Kingdom, \
     København->Denmark). If unsure, infer it from the phone country code.",
    "dates: interpret them as travel dates. If a year is missing, assume the current year and \
     prefer the next future date relative to today. Normalize to YYYY-MM-DD; with a single day, \
     fill date_debut and leave date_fin empty. Accept DD-MM-YYYY, YYYY-MM-DD, MM-DD-YYYY and \
     entries with a time such as '27-09-2025 17:30'.",
    "nb_personnes: capture the passenger or group size (people, pax, passengers, participants, \
     adults plus children when a total is given). Return just the number or a range such as \
     '10-20'.",
    "itinerary: only city-to-city as A->B. Reduce street addresses, postcodes and countries to \
     city names, for the itinerary as well as for ville and villes.",
    "Unknown fields are an empty string or an empty array. Use the input language for \
     langue_detectee.",
    "The input may be an HTML table or a quoted form with label/value rows. Read lines such as \
     'Label | Value' or 'Label: Value' as fields (Email, Nom/Name/Naam, Départ/From/Vertrekstad, \
     Arrivée/To/Aankomststad, Date de départ/Vertrekdatum, Date de retour/Terugkeerdatum, \
     Personnes/PAX, Véhicule, Type de voyage).",
    "Dutch forms map as follows: 'Naam' -> prenom/nom (first and last token), 'E-mailadres' -> \
     email, 'Vertrekstad' -> ville, 'Aankomststad' -> villes, 'Vertrekdatum' -> date_debut, \
     'Terugkeerdatum' -> date_fin, 'Hoeveel reizigers nemen deel aan deze reis?' -> nb_personnes \
     (keep ranges like '10 - 20'), 'Voor wat voor type reis wilt u een offerte?' -> type_voyage \
     ('Retourreis (Heen en terug)' -> 'aller-retour'). Free-text details under additional \
     information go to infos_libres and corps_mail.",
    "Leave type_vehicule empty unless a vehicle type is explicitly stated.",
];

/// The full prompt for one email.
pub fn build_prompt(email_text: &str) -> String {
    let mut prompt = String::from(
        "You are an information extraction assistant for ground transport bookings. \
         Extract details precisely. Return STRICT JSON with an array named 'demandes'. \
         Each item must contain these keys: ",
    );
    prompt.push_str(OUTPUT_KEYS);
    prompt.push_str(".\nRules:\n");
    for (i, rule) in RULES.iter().enumerate() {
        prompt.push_str(&format!("{}) {}\n", i + 1, rule));
    }
    prompt.push_str("\nInput email text:\n\n");
    prompt.push_str(email_text);
    prompt
}
