// src/common/request_seq.rs

use std::collections::HashMap;
use uuid::Uuid;

/// Numera as leituras por alvo. Só a resposta da leitura mais recente é aplicada;
/// as outras chegaram fora de ordem e são descartadas.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    next: u64,
    latest: HashMap<Uuid, u64>,
}

impl RequestSequencer {
    pub fn issue(&mut self, target: Uuid) -> u64 {
        self.next += 1;
        self.latest.insert(target, self.next);
        self.next
    }

    pub fn is_latest(&self, target: Uuid, ticket: u64) -> bool {
        self.latest.get(&target) == Some(&ticket)
    }

    /// Marca para leituras em lote (listagem), que não têm alvo único.
    pub fn watermark(&self) -> u64 {
        self.next
    }

    /// Houve leitura individual de `target` depois da marca?
    pub fn issued_after(&self, target: Uuid, mark: u64) -> bool {
        self.latest.get(&target).is_some_and(|t| *t > mark)
    }
}
